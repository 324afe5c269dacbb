//! One document through extractor → resolver → classifier → aggregator.

use crate::aggregator::{Aggregator, ScanTicket};
use crate::classifier::Classifier;
use crate::config::AnnotationConfig;
use crate::error::{AlphabetaError, Result};
use crate::extractor::IdentifierExtractor;
use crate::resolver::HoverResolver;
use alphabeta_api::{Document, DocumentHost, HoverOracle};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The file's entry was replaced.
    Published { annotations: usize },
    /// A newer scan of the file (or a reset) superseded this one.
    Stale,
}

/// Summary of one pass over the visible documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub documents: usize,
    pub published: usize,
    pub stale: usize,
    pub failed: usize,
    pub annotations: usize,
}

#[derive(Clone)]
pub struct ScanPipeline {
    extractor: Arc<IdentifierExtractor>,
    resolver: HoverResolver,
    aggregator: Arc<Aggregator>,
}

impl ScanPipeline {
    pub fn new(oracle: Arc<dyn HoverOracle>, aggregator: Arc<Aggregator>) -> Self {
        Self {
            extractor: Arc::new(IdentifierExtractor::new()),
            resolver: HoverResolver::new(oracle),
            aggregator,
        }
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Scan one document on its own ticket.
    pub async fn scan_document(
        &self,
        document: Arc<Document>,
        config: &AnnotationConfig,
    ) -> Result<ScanOutcome> {
        let ticket = self.aggregator.begin_scan(document.path());
        self.scan_with_ticket(ticket, document, config).await
    }

    async fn scan_with_ticket(
        &self,
        ticket: ScanTicket,
        document: Arc<Document>,
        config: &AnnotationConfig,
    ) -> Result<ScanOutcome> {
        // Superseded while waiting its turn in the pass
        if !self.aggregator.is_current(&ticket) {
            return Ok(ScanOutcome::Stale);
        }

        let extractor = self.extractor.clone();
        let doc = document.clone();
        let positions = tokio::task::spawn_blocking(move || extractor.extract(&doc))
            .await
            .map_err(|e| AlphabetaError::scan_failed(document.path(), format!("extractor task: {}", e)))?
            .map_err(|e| AlphabetaError::scan_failed(document.path(), e.to_string()))?;

        let resolution = self.resolver.resolve(&document, &positions).await;
        if resolution.all_failed() {
            return Err(AlphabetaError::scan_failed(
                document.path(),
                format!("all {} hover requests failed", positions.len()),
            ));
        }

        let classifier = Classifier::new(config);
        let set = Aggregator::aggregate(&classifier, &document, &positions, &resolution.hovers);
        let annotations = set.len();

        if self.aggregator.publish(ticket, set) {
            tracing::debug!(
                path = %document.path().display(),
                version = document.version(),
                identifiers = positions.len(),
                annotations,
                "published annotations"
            );
            Ok(ScanOutcome::Published { annotations })
        } else {
            Ok(ScanOutcome::Stale)
        }
    }

    /// Scan every visible document in host order. A failing document is logged
    /// and skipped.
    ///
    /// Tickets for the whole pass are taken before the first document is
    /// scanned, so a reset or an eviction during the pass voids the rest of it.
    pub async fn scan_pass(&self, host: Arc<dyn DocumentHost>, config: Arc<AnnotationConfig>) -> PassReport {
        // Hosts may read from disk while enumerating
        let documents = match tokio::task::spawn_blocking(move || host.visible_documents()).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!("document enumeration failed: {}", e);
                return PassReport::default();
            }
        };
        let tickets: Vec<ScanTicket> = documents
            .iter()
            .map(|document| self.aggregator.begin_scan(document.path()))
            .collect();
        let mut report = PassReport {
            documents: documents.len(),
            ..PassReport::default()
        };

        for (document, ticket) in documents.into_iter().zip(tickets) {
            match self.scan_with_ticket(ticket, document, &config).await {
                Ok(ScanOutcome::Published { annotations }) => {
                    report.published += 1;
                    report.annotations += annotations;
                }
                Ok(ScanOutcome::Stale) => report.stale += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("{}", e);
                }
            }
        }

        tracing::debug!(
            documents = report.documents,
            published = report.published,
            stale = report.stale,
            failed = report.failed,
            "scan pass finished"
        );
        report
    }
}
