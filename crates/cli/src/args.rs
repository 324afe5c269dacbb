use alphabeta_api::{HoverOracle, Phase};
use alphabeta_core::{AnnotationConfig, MultiOracle, RangePolicy};
use alphabeta_lsp::LspHoverOracle;
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SERVER: &str = "typescript-language-server --stdio";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RangePolicyArg {
    LastEntry,
    FirstMatching,
}

impl From<RangePolicyArg> for RangePolicy {
    fn from(arg: RangePolicyArg) -> Self {
        match arg {
            RangePolicyArg::LastEntry => RangePolicy::LastEntry,
            RangePolicyArg::FirstMatching => RangePolicy::FirstMatching,
        }
    }
}

/// Options shared by every command that runs the engine.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Language server command line; repeat to combine several servers
    #[arg(long = "server", value_name = "CMD")]
    pub servers: Vec<String>,

    /// Per-request hover timeout
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub hover_timeout_ms: u64,

    /// JSON settings file (the `AlphaBETA` section or its contents)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds between periodic scans
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    #[arg(long)]
    pub no_internal: bool,

    #[arg(long)]
    pub no_alpha: bool,

    #[arg(long)]
    pub no_beta: bool,

    /// Also report `@deprecated` symbols
    #[arg(long)]
    pub deprecated: bool,

    /// Which hover entry supplies the annotated range
    #[arg(long, value_enum)]
    pub range_policy: Option<RangePolicyArg>,
}

/// Running language servers plus the oracle that fans out over them.
pub struct Oracles {
    pub servers: Vec<Arc<LspHoverOracle>>,
    pub combined: Arc<dyn HoverOracle>,
}

impl Oracles {
    pub async fn shutdown(&self) {
        for server in &self.servers {
            server.shutdown().await;
        }
    }
}

impl EngineArgs {
    /// Settings file first, then command-line overrides.
    pub fn annotation_config(&self) -> Result<AnnotationConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                AnnotationConfig::from_settings(&serde_json::from_str(&raw)?)?
            }
            None => AnnotationConfig::default(),
        };

        if let Some(interval) = self.interval {
            config.control.refresh_interval = interval;
        }
        if let Some(policy) = self.range_policy {
            config.control.range_policy = policy.into();
        }
        for (flag, phase) in [
            (self.no_internal, Phase::Internal),
            (self.no_alpha, Phase::Alpha),
            (self.no_beta, Phase::Beta),
        ] {
            if flag {
                config.phase.set(phase, false);
            }
        }
        if self.deprecated {
            config.phase.set(Phase::Deprecated, true);
        }
        Ok(config)
    }

    pub fn server_commands(&self) -> Result<Vec<Vec<String>>, Box<dyn std::error::Error>> {
        let lines: Vec<&str> = if self.servers.is_empty() {
            vec![DEFAULT_SERVER]
        } else {
            self.servers.iter().map(String::as_str).collect()
        };
        lines
            .into_iter()
            .map(|line| {
                shlex::split(line)
                    .filter(|argv| !argv.is_empty())
                    .ok_or_else(|| format!("invalid server command: {}", line).into())
            })
            .collect()
    }

    pub async fn spawn_oracles(&self, root: &Path) -> Result<Oracles, Box<dyn std::error::Error>> {
        let timeout = Duration::from_millis(self.hover_timeout_ms);
        let mut servers = Vec::new();
        for argv in self.server_commands()? {
            servers.push(Arc::new(LspHoverOracle::spawn(&argv, Some(root), timeout).await?));
        }

        let combined: Arc<dyn HoverOracle> = match servers.as_slice() {
            [single] => single.clone(),
            many => Arc::new(MultiOracle::new(
                many.iter().map(|s| s.clone() as Arc<dyn HoverOracle>).collect(),
            )),
        };
        Ok(Oracles { servers, combined })
    }
}
