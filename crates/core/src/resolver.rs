//! Concurrent hover resolution.

use alphabeta_api::{ApiError, ApiResult, Document, HoverContent, HoverOracle, Position};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

/// Hover results for one batch of positions.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// `hovers[i]` belongs to `positions[i]`.
    pub hovers: Vec<Vec<HoverContent>>,
    /// Requests the oracle failed to answer; their slots hold empty vectors.
    pub failed: usize,
}

impl Resolution {
    /// True when a non-empty batch got no answer at all.
    pub fn all_failed(&self) -> bool {
        !self.hovers.is_empty() && self.failed == self.hovers.len()
    }
}

#[derive(Clone)]
pub struct HoverResolver {
    oracle: Arc<dyn HoverOracle>,
}

impl HoverResolver {
    pub fn new(oracle: Arc<dyn HoverOracle>) -> Self {
        Self { oracle }
    }

    /// Query every position at once and wait for all of them to settle.
    pub async fn resolve(&self, document: &Document, positions: &[Position]) -> Resolution {
        let requests = positions
            .iter()
            .map(|position| self.oracle.hover(document, *position));
        let results = join_all(requests).await;

        let mut failed = 0;
        let hovers = results
            .into_iter()
            .zip(positions)
            .map(|(result, position)| match result {
                Ok(hovers) => hovers,
                Err(e) => {
                    failed += 1;
                    tracing::trace!(
                        path = %document.path().display(),
                        %position,
                        "hover request failed: {}",
                        e
                    );
                    Vec::new()
                }
            })
            .collect();

        if failed > 0 {
            tracing::debug!(
                path = %document.path().display(),
                failed,
                total = positions.len(),
                "some hover requests failed"
            );
        }

        Resolution { hovers, failed }
    }
}

/// Several oracles answering as one, in registration order.
///
/// A provider that fails contributes nothing; the position only fails when
/// every provider does.
pub struct MultiOracle {
    providers: Vec<Arc<dyn HoverOracle>>,
}

impl MultiOracle {
    pub fn new(providers: Vec<Arc<dyn HoverOracle>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl HoverOracle for MultiOracle {
    async fn hover(&self, document: &Document, position: Position) -> ApiResult<Vec<HoverContent>> {
        let results = join_all(self.providers.iter().map(|p| p.hover(document, position))).await;

        let mut merged = Vec::new();
        let mut last_error = None;
        let mut answered = false;
        for result in results {
            match result {
                Ok(hovers) => {
                    answered = true;
                    merged.extend(hovers);
                }
                Err(e) => last_error = Some(e),
            }
        }

        match (answered, last_error) {
            (false, Some(e)) => Err(e),
            (false, None) => Err(ApiError::OracleUnavailable("no hover providers registered".into())),
            (true, _) => Ok(merged),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Answers with the position's character as text, slower for earlier positions.
    struct ReversedLatencyOracle;

    #[async_trait]
    impl HoverOracle for ReversedLatencyOracle {
        async fn hover(&self, _document: &Document, position: Position) -> ApiResult<Vec<HoverContent>> {
            tokio::time::sleep(Duration::from_millis(50 - position.character as u64 * 10)).await;
            if position.character == 2 {
                return Err(ApiError::OracleUnavailable("timeout".into()));
            }
            if position.character == 3 {
                return Ok(Vec::new());
            }
            Ok(vec![HoverContent::new(vec![position.character.to_string()], None)])
        }
    }

    struct FixedOracle(Option<&'static str>);

    #[async_trait]
    impl HoverOracle for FixedOracle {
        async fn hover(&self, _document: &Document, _position: Position) -> ApiResult<Vec<HoverContent>> {
            match self.0 {
                Some(text) => Ok(vec![HoverContent::new(vec![text.into()], None)]),
                None => Err(ApiError::OracleUnavailable("down".into())),
            }
        }
    }

    fn document() -> Document {
        Document::new("/x.ts", "abcd", 1)
    }

    #[tokio::test(start_paused = true)]
    async fn results_keep_position_order_and_absorb_failures() {
        let resolver = HoverResolver::new(Arc::new(ReversedLatencyOracle));
        let positions: Vec<Position> = (0..4).map(|c| Position::new(0, c)).collect();

        let resolution = resolver.resolve(&document(), &positions).await;

        assert_eq!(resolution.hovers.len(), 4);
        assert_eq!(resolution.hovers[0][0].contents, vec!["0".to_string()]);
        assert_eq!(resolution.hovers[1][0].contents, vec!["1".to_string()]);
        assert!(resolution.hovers[2].is_empty());
        assert!(resolution.hovers[3].is_empty());
        assert_eq!(resolution.failed, 1);
        assert!(!resolution.all_failed());
    }

    #[tokio::test]
    async fn empty_batch_is_not_a_failure() {
        let resolver = HoverResolver::new(Arc::new(FixedOracle(None)));
        let resolution = resolver.resolve(&document(), &[]).await;
        assert!(resolution.hovers.is_empty());
        assert!(!resolution.all_failed());
    }

    #[tokio::test]
    async fn multi_oracle_concatenates_in_registration_order() {
        let oracle = MultiOracle::new(vec![
            Arc::new(FixedOracle(Some("first"))),
            Arc::new(FixedOracle(None)),
            Arc::new(FixedOracle(Some("second"))),
        ]);
        let hovers = oracle.hover(&document(), Position::new(0, 1)).await.unwrap();
        let texts: Vec<&str> = hovers.iter().map(|h| h.contents[0].as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn multi_oracle_fails_only_when_every_provider_fails() {
        let oracle = MultiOracle::new(vec![Arc::new(FixedOracle(None)), Arc::new(FixedOracle(None))]);
        assert!(oracle.hover(&document(), Position::new(0, 1)).await.is_err());
        assert!(MultiOracle::new(vec![]).hover(&document(), Position::new(0, 0)).await.is_err());
    }
}
