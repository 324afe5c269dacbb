#![allow(dead_code)]

use alphabeta_api::{
    ApiError, ApiResult, Document, DocumentHost, HoverContent, HoverOracle, Position, Range,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers hovers from a symbol-name → documentation table.
#[derive(Default)]
pub struct TableOracle {
    docs: Mutex<HashMap<String, String>>,
    failing: Mutex<Vec<String>>,
    down: AtomicBool,
    delay: Mutex<Duration>,
    pub requests: AtomicUsize,
}

impl TableOracle {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        let oracle = Self::default();
        for (name, doc) in entries {
            oracle.document(name, doc);
        }
        oracle
    }

    pub fn document(&self, name: &str, doc: &str) {
        self.docs.lock().unwrap().insert(name.to_string(), doc.to_string());
    }

    pub fn fail_for(&self, name: &str) {
        self.failing.lock().unwrap().push(name.to_string());
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl HoverOracle for TableOracle {
    async fn hover(&self, document: &Document, position: Position) -> ApiResult<Vec<HoverContent>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(ApiError::OracleUnavailable("server down".into()));
        }

        let Some(range) = document.word_end_range(position) else {
            return Ok(Vec::new());
        };
        let name = document.text_in(range).to_string();
        if self.failing.lock().unwrap().contains(&name) {
            return Err(ApiError::OracleUnavailable(format!("timeout for {}", name)));
        }
        Ok(self
            .docs
            .lock()
            .unwrap()
            .get(&name)
            .map(|doc| vec![HoverContent::new(vec![doc.clone()], Some(range))])
            .unwrap_or_default())
    }
}

/// In-memory editor: a list of visible documents plus a navigation log.
#[derive(Default)]
pub struct MemoryHost {
    documents: Mutex<Vec<Arc<Document>>>,
    pub navigations: Mutex<Vec<(PathBuf, Range)>>,
}

impl MemoryHost {
    pub fn with(documents: &[(&str, &str)]) -> Self {
        let host = Self::default();
        for (path, text) in documents {
            host.open(path, text);
        }
        host
    }

    pub fn open(&self, path: &str, text: &str) {
        let mut documents = self.documents.lock().unwrap();
        let version = documents.iter().filter(|d| d.path() == Path::new(path)).count() as i32 + 1;
        documents.retain(|d| d.path() != Path::new(path));
        documents.push(Arc::new(Document::new(path, text, version)));
    }

    pub fn close(&self, path: &str) {
        self.documents.lock().unwrap().retain(|d| d.path() != Path::new(path));
    }
}

#[async_trait]
impl DocumentHost for MemoryHost {
    fn visible_documents(&self) -> Vec<Arc<Document>> {
        self.documents.lock().unwrap().clone()
    }

    async fn show_document(&self, path: &Path, selection: Range) -> ApiResult<()> {
        if !self.documents.lock().unwrap().iter().any(|d| d.path() == path) {
            return Err(ApiError::NotFound(path.display().to_string()));
        }
        self.navigations.lock().unwrap().push((path.to_path_buf(), selection));
        Ok(())
    }
}

pub fn range(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}
