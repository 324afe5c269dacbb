//! Open editor documents, exposed to the engine as its document host.

use crate::util;
use alphabeta_api::{ApiError, ApiResult, Document, DocumentHost, Range};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_lsp::Client;
use tower_lsp::lsp_types::{ShowDocumentParams, Url};

/// Documents are keyed by file path; non-file URIs are not tracked.
pub struct OpenDocuments {
    documents: DashMap<PathBuf, Arc<Document>>,
    client: Option<Client>,
}

impl OpenDocuments {
    pub fn new(client: Option<Client>) -> Self {
        Self {
            documents: DashMap::new(),
            client,
        }
    }

    pub fn open(&self, uri: &Url, text: String, version: i32) -> Option<PathBuf> {
        let path = util::uri_to_path(uri)?;
        self.documents
            .insert(path.clone(), Arc::new(Document::new(path.clone(), text, version)));
        Some(path)
    }

    pub fn update(&self, path: &Path, document: Document) {
        self.documents.insert(path.to_path_buf(), Arc::new(document));
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Document>> {
        self.documents.get(path).map(|d| d.clone())
    }

    pub fn close(&self, uri: &Url) -> Option<PathBuf> {
        let path = util::uri_to_path(uri)?;
        self.documents.remove(&path).map(|(path, _)| path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.documents.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentHost for OpenDocuments {
    fn visible_documents(&self) -> Vec<Arc<Document>> {
        let mut documents: Vec<Arc<Document>> = self.documents.iter().map(|d| d.value().clone()).collect();
        documents.sort_by(|a, b| a.path().cmp(b.path()));
        documents
    }

    async fn show_document(&self, path: &Path, selection: Range) -> ApiResult<()> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ApiError::Unsupported("no editor connected".into()))?;
        let uri = Url::from_file_path(path)
            .map_err(|_| ApiError::NotFound(path.display().to_string()))?;

        let shown = client
            .show_document(ShowDocumentParams {
                uri,
                external: Some(false),
                take_focus: Some(true),
                selection: Some(util::to_lsp_range(selection)),
            })
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        if shown {
            Ok(())
        } else {
            Err(ApiError::NotFound(path.display().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphabeta_api::Position;

    #[test]
    fn visible_documents_are_sorted_by_path() {
        let docs = OpenDocuments::new(None);
        docs.open(&Url::parse("file:///src/b.ts").unwrap(), "b".into(), 1);
        docs.open(&Url::parse("file:///src/a.ts").unwrap(), "a".into(), 1);
        assert!(docs.open(&Url::parse("untitled:x").unwrap(), "x".into(), 1).is_none());

        let paths: Vec<PathBuf> = docs.visible_documents().iter().map(|d| d.path().to_path_buf()).collect();
        assert_eq!(paths, vec![PathBuf::from("/src/a.ts"), PathBuf::from("/src/b.ts")]);
    }

    #[test]
    fn close_forgets_document() {
        let docs = OpenDocuments::new(None);
        let uri = Url::parse("file:///src/a.ts").unwrap();
        docs.open(&uri, "a".into(), 1);
        assert_eq!(docs.close(&uri), Some(PathBuf::from("/src/a.ts")));
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn navigation_without_editor_is_unsupported() {
        let docs = OpenDocuments::new(None);
        let result = docs
            .show_document(Path::new("/src/a.ts"), Range::new(Position::new(0, 0), Position::new(0, 1)))
            .await;
        assert!(matches!(result, Err(ApiError::Unsupported(_))));
    }
}
