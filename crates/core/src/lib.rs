//! Lifecycle annotation engine.
//!
//! Finds every identifier in a TypeScript document, asks a hover oracle for its
//! documentation, classifies `*@internal*`, `*@alpha*`, `*@beta*` and
//! `*@deprecated*` markers, and keeps a per-file index of the results fresh.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod pipeline;
pub mod presentation;
pub mod resolver;
pub mod scheduler;

pub use aggregator::{Aggregator, ScanTicket, SubscriberResult, SubscriptionId};
pub use classifier::Classifier;
pub use config::{AnnotationConfig, ConfigStore, RangePolicy};
pub use engine::{AnnotationEngine, AnnotationEngineBuilder};
pub use error::{AlphabetaError, Result};
pub use extractor::IdentifierExtractor;
pub use pipeline::{PassReport, ScanOutcome, ScanPipeline};
pub use resolver::{HoverResolver, MultiOracle, Resolution};
pub use scheduler::{SchedulerHandle, SchedulerState};
