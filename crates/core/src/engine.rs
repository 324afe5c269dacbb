//! Outward-facing annotation engine.
//!
//! Wires the scan pipeline, the aggregator and the refresh scheduler to a
//! document host and a hover oracle. Presentation layers only talk to this type.

use crate::aggregator::{Aggregator, SubscriberResult, SubscriptionId};
use crate::config::{AnnotationConfig, ConfigStore};
use crate::pipeline::{PassReport, ScanPipeline};
use crate::scheduler::{RefreshScheduler, SchedulerHandle, SchedulerState};
use alphabeta_api::{AnnotationIndex, DocumentHost, FileAnnotationSet, HoverOracle, Range};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

pub struct AnnotationEngineBuilder {
    host: Arc<dyn DocumentHost>,
    oracle: Arc<dyn HoverOracle>,
    config: AnnotationConfig,
}

impl AnnotationEngineBuilder {
    pub fn new(host: Arc<dyn DocumentHost>, oracle: Arc<dyn HoverOracle>) -> Self {
        Self {
            host,
            oracle,
            config: AnnotationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnnotationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> AnnotationEngine {
        let aggregator = Arc::new(Aggregator::new());
        AnnotationEngine {
            pipeline: ScanPipeline::new(self.oracle, aggregator.clone()),
            aggregator,
            host: self.host,
            config: ConfigStore::new(self.config),
            scheduler: OnceLock::new(),
            cancel_token: CancellationToken::new(),
        }
    }
}

pub struct AnnotationEngine {
    pipeline: ScanPipeline,
    aggregator: Arc<Aggregator>,
    host: Arc<dyn DocumentHost>,
    config: ConfigStore,
    scheduler: OnceLock<SchedulerHandle>,
    cancel_token: CancellationToken,
}

impl AnnotationEngine {
    pub fn builder(host: Arc<dyn DocumentHost>, oracle: Arc<dyn HoverOracle>) -> AnnotationEngineBuilder {
        AnnotationEngineBuilder::new(host, oracle)
    }

    /// Start the refresh scheduler. Must be called inside a tokio runtime.
    /// Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let mut started = false;
        self.scheduler.get_or_init(|| {
            started = true;
            RefreshScheduler::new(self.pipeline.clone(), self.host.clone(), self.config.clone())
                .spawn(self.cancel_token.child_token())
        });
        started
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(Arc<AnnotationIndex>) -> SubscriberResult + Send + Sync + 'static,
    {
        self.aggregator.subscribe(handler)
    }

    pub fn current_index(&self) -> Arc<AnnotationIndex> {
        self.aggregator.current_index()
    }

    pub fn file_annotations(&self, path: &Path) -> Option<Arc<FileAnnotationSet>> {
        self.aggregator.file_annotations(path)
    }

    /// Scan the visible documents now, outside the timer cadence. While
    /// annotations are disabled this clears the index instead.
    pub fn trigger_rescan(&self) {
        match self.scheduler.get() {
            Some(scheduler) => scheduler.rescan(),
            None => {
                if !self.config.current().enabled() {
                    self.aggregator.reset();
                }
                self.start();
            }
        }
    }

    pub fn config(&self) -> Arc<AnnotationConfig> {
        self.config.current()
    }

    pub fn update_config(&self, config: AnnotationConfig) {
        self.config.update(config);
    }

    pub fn document_closed(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        match self.scheduler.get() {
            Some(scheduler) => scheduler.document_closed(path),
            None => {
                self.aggregator.evict(&path);
            }
        }
    }

    /// Ask the host to reveal `range` in `path`. Failures are logged, never returned.
    pub async fn navigate_to(&self, path: &Path, range: Range) {
        if let Err(e) = self.host.show_document(path, range).await {
            tracing::warn!(path = %path.display(), %range, "navigation failed: {}", e);
        }
    }

    /// Run a single pass inline, without the scheduler.
    pub async fn scan_once(&self) -> PassReport {
        let config = self.config.current();
        if !config.enabled() {
            self.aggregator.reset();
            return PassReport::default();
        }
        self.pipeline.scan_pass(self.host.clone(), config).await
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler
            .get()
            .map(SchedulerHandle::state)
            .unwrap_or(SchedulerState::Disabled)
    }

    pub fn passes_completed(&self) -> u64 {
        self.scheduler
            .get()
            .map(SchedulerHandle::passes_completed)
            .unwrap_or(0)
    }

    /// Wait until the scheduler has completed `count` passes. Returns at once
    /// if the scheduler was never started.
    pub async fn wait_for_passes(&self, count: u64) {
        if let Some(scheduler) = self.scheduler.get() {
            scheduler.wait_for_passes(count).await;
        }
    }

    pub async fn shutdown(&self) {
        if let Some(scheduler) = self.scheduler.get() {
            scheduler.shutdown().await;
        }
        self.cancel_token.cancel();
    }
}

impl Drop for AnnotationEngine {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
