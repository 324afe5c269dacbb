use crate::error::ApiResult;
use crate::models::{Document, Range};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// The editor-like environment the engine scans on behalf of.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Documents that need scanning on the current tick, in host order.
    fn visible_documents(&self) -> Vec<Arc<Document>>;

    /// Open `path` and move the selection to `selection`.
    async fn show_document(&self, path: &Path, selection: Range) -> ApiResult<()>;
}
