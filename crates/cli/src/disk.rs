//! Document host over files on disk, re-read on every pass.
//!
//! Reads are blocking; the scan pipeline enumerates hosts on the blocking pool.

use alphabeta_api::{ApiError, ApiResult, Document, DocumentHost, Range};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

struct Snapshot {
    hash: u64,
    document: Arc<Document>,
}

pub struct DiskDocuments {
    files: Vec<PathBuf>,
    snapshots: DashMap<PathBuf, Snapshot>,
}

impl DiskDocuments {
    /// Paths are made absolute so they can be turned into `file://` URIs.
    pub fn new(files: Vec<PathBuf>) -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let files = files
            .into_iter()
            .map(|f| f.canonicalize().unwrap_or_else(|_| cwd.join(f)))
            .collect();
        Ok(Self {
            files,
            snapshots: DashMap::new(),
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Current document for `path`; the version only moves when the content hash does.
    fn load(&self, path: &Path) -> std::io::Result<Arc<Document>> {
        let text = std::fs::read_to_string(path)?;
        let hash = xxh3_64(text.as_bytes());

        let mut entry = self.snapshots.entry(path.to_path_buf()).or_insert_with(|| Snapshot {
            hash,
            document: Arc::new(Document::new(path, text.clone(), 1)),
        });
        if entry.hash != hash {
            let version = entry.document.version() + 1;
            *entry = Snapshot {
                hash,
                document: Arc::new(Document::new(path, text, version)),
            };
        }
        Ok(entry.document.clone())
    }
}

#[async_trait]
impl DocumentHost for DiskDocuments {
    fn visible_documents(&self) -> Vec<Arc<Document>> {
        self.files
            .iter()
            .filter_map(|path| match self.load(path) {
                Ok(document) => Some(document),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping unreadable file: {}", e);
                    self.snapshots.remove(path);
                    None
                }
            })
            .collect()
    }

    async fn show_document(&self, path: &Path, selection: Range) -> ApiResult<()> {
        if !path.is_file() {
            return Err(ApiError::NotFound(path.display().to_string()));
        }
        println!(
            "{}:{}:{}",
            path.display(),
            selection.start.line + 1,
            selection.start.character + 1
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_moves_only_when_content_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ts");
        std::fs::write(&file, "preview();").unwrap();

        let host = DiskDocuments::new(vec![file.clone()]).unwrap();
        assert_eq!(host.visible_documents()[0].version(), 1);
        assert_eq!(host.visible_documents()[0].version(), 1);

        std::fs::write(&file, "preview(secret);").unwrap();
        let documents = host.visible_documents();
        assert_eq!(documents[0].version(), 2);
        assert_eq!(documents[0].text(), "preview(secret);");
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.ts");
        std::fs::write(&present, "a;").unwrap();

        let host = DiskDocuments::new(vec![dir.path().join("gone.ts"), present]).unwrap();
        let documents = host.visible_documents();
        assert_eq!(documents.len(), 1);
        assert!(documents[0].path().is_absolute());
    }

    #[tokio::test]
    async fn navigation_needs_an_existing_file() {
        let host = DiskDocuments::new(vec![]).unwrap();
        let range = Range::default();
        assert!(host.show_document(Path::new("/definitely/not/here.ts"), range).await.is_err());
    }
}
