//! Configuration snapshot consumed by every scan.
//!
//! The settings mirror the editor-facing `AlphaBETA` section:
//! `control.*`, `phase.*` and `reporting.*`. A scan pass captures one
//! `Arc<AnnotationConfig>` and never reads configuration again.

use crate::error::{AlphabetaError, Result};
use alphabeta_api::Phase;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Settings section name used by editors.
pub const SETTINGS_SECTION: &str = "AlphaBETA";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotationConfig {
    pub control: ControlSettings,
    pub phase: PhaseSettings,
    pub reporting: ReportingSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlSettings {
    /// Global switch gating every phase.
    pub show_annotations: bool,
    /// Seconds between periodic scan passes.
    pub refresh_interval: u64,
    /// Which hover entry supplies the annotated range.
    pub range_policy: RangePolicy,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            show_annotations: true,
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            range_policy: RangePolicy::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PhaseSettings {
    pub show_internal: bool,
    pub show_alpha: bool,
    pub show_beta: bool,
    pub show_deprecated: bool,
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            show_internal: true,
            show_alpha: true,
            show_beta: true,
            show_deprecated: false,
        }
    }
}

impl PhaseSettings {
    pub fn shows(&self, phase: Phase) -> bool {
        match phase {
            Phase::Internal => self.show_internal,
            Phase::Alpha => self.show_alpha,
            Phase::Beta => self.show_beta,
            Phase::Deprecated => self.show_deprecated,
        }
    }

    pub fn set(&mut self, phase: Phase, enabled: bool) {
        match phase {
            Phase::Internal => self.show_internal = enabled,
            Phase::Alpha => self.show_alpha = enabled,
            Phase::Beta => self.show_beta = enabled,
            Phase::Deprecated => self.show_deprecated = enabled,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportingSettings {
    pub show_in_status_bar: bool,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            show_in_status_bar: true,
        }
    }
}

/// Hover entry that supplies the range once a position is classified.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum RangePolicy {
    /// Last entry in provider order, whether or not it carried the marker.
    #[default]
    LastEntry,
    /// First entry that carries the winning marker.
    FirstMatching,
}

impl AnnotationConfig {
    pub fn enabled(&self) -> bool {
        self.control.show_annotations
    }

    /// A phase is live only when both its own flag and the global flag are set.
    pub fn phase_enabled(&self, phase: Phase) -> bool {
        self.control.show_annotations && self.phase.shows(phase)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.control.refresh_interval.max(1))
    }

    /// Parse editor settings. Accepts the bare section or one nested under `AlphaBETA`.
    pub fn from_settings(value: &serde_json::Value) -> Result<Self> {
        let section = value.get(SETTINGS_SECTION).unwrap_or(value);
        if section.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(section.clone())
            .map_err(|e| AlphabetaError::Config(format!("invalid {} settings: {}", SETTINGS_SECTION, e)))
    }
}

/// Shared, change-notifying holder of the current configuration.
#[derive(Clone)]
pub struct ConfigStore {
    tx: Arc<watch::Sender<Arc<AnnotationConfig>>>,
}

impl ConfigStore {
    pub fn new(config: AnnotationConfig) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Arc<AnnotationConfig> {
        self.tx.borrow().clone()
    }

    pub fn update(&self, config: AnnotationConfig) {
        tracing::debug!(
            show_annotations = config.control.show_annotations,
            refresh_interval = config.control.refresh_interval,
            show_internal = config.phase.show_internal,
            show_alpha = config.phase.show_alpha,
            show_beta = config.phase.show_beta,
            show_deprecated = config.phase.show_deprecated,
            show_in_status_bar = config.reporting.show_in_status_bar,
            "configuration updated"
        );
        self.tx.send_replace(Arc::new(config));
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AnnotationConfig>> {
        self.tx.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(AnnotationConfig::default())
    }
}
