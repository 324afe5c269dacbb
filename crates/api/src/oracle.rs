use crate::error::ApiResult;
use crate::models::{Document, HoverContent, Position};
use async_trait::async_trait;

/// Language-intelligence service that supplies documentation for a position.
///
/// Implementations may answer in any order and with any latency; an empty
/// vector means "no documentation here" and is not an error.
#[async_trait]
pub trait HoverOracle: Send + Sync {
    async fn hover(&self, document: &Document, position: Position) -> ApiResult<Vec<HoverContent>>;
}
