//! Refresh scheduler.
//!
//! A single tokio task decides when scan passes run. Passes execute as their own
//! tasks so a slow oracle never blocks commands or configuration changes; the
//! periodic timer is armed only once every in-flight pass has finished.

use crate::config::{AnnotationConfig, ConfigStore};
use crate::pipeline::ScanPipeline;
use alphabeta_api::DocumentHost;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Disabled,
    /// Timer armed, nothing in flight.
    Idle,
    Scanning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Document opened or saved.
    Rescan,
    DocumentClosed(PathBuf),
    Shutdown,
}

pub struct RefreshScheduler {
    pipeline: ScanPipeline,
    host: Arc<dyn DocumentHost>,
    config: ConfigStore,
}

impl RefreshScheduler {
    pub fn new(pipeline: ScanPipeline, host: Arc<dyn DocumentHost>, config: ConfigStore) -> Self {
        Self {
            pipeline,
            host,
            config,
        }
    }

    /// Start the scheduler loop on the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> SchedulerHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SchedulerState::Disabled);
        let (passes_tx, passes_rx) = watch::channel(0u64);

        let task = tokio::spawn(self.run(commands_rx, state_tx, passes_tx, cancel.clone()));

        SchedulerHandle {
            commands: commands_tx,
            state: state_rx,
            passes: passes_rx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    async fn run(
        self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        state: watch::Sender<SchedulerState>,
        completed: watch::Sender<u64>,
        cancel: CancellationToken,
    ) {
        let mut config_rx = self.config.subscribe();
        let mut passes: JoinSet<()> = JoinSet::new();
        let mut deadline: Option<Instant> = None;

        let initial = config_rx.borrow_and_update().clone();
        let mut enabled = initial.enabled();
        if enabled {
            self.start_pass(&mut passes, initial);
        }
        publish_state(&state, enabled, &passes);
        tracing::info!(enabled, "refresh scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                command = commands.recv() => match command {
                    Some(Command::Rescan) => {
                        deadline = None;
                        if enabled {
                            self.start_pass(&mut passes, self.config.current());
                        } else {
                            self.pipeline.aggregator().reset();
                        }
                    }
                    Some(Command::DocumentClosed(path)) => {
                        if self.pipeline.aggregator().evict(&path) {
                            tracing::debug!(path = %path.display(), "evicted closed document");
                        }
                    }
                    Some(Command::Shutdown) | None => break,
                },

                changed = config_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let config = config_rx.borrow_and_update().clone();
                    deadline = None;
                    if config.enabled() {
                        if !enabled {
                            tracing::info!("annotations enabled");
                        }
                        enabled = true;
                        self.start_pass(&mut passes, config);
                    } else {
                        if enabled {
                            tracing::info!("annotations disabled; clearing index");
                        }
                        enabled = false;
                        self.pipeline.aggregator().reset();
                    }
                }

                Some(joined) = passes.join_next(), if !passes.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!("scan pass panicked: {}", e);
                        }
                    }
                    completed.send_modify(|n| *n += 1);
                    if passes.is_empty() && enabled {
                        let interval = self.config.current().refresh_interval();
                        deadline = Some(Instant::now() + interval);
                        tracing::trace!(?interval, "timer armed");
                    }
                }

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.start_pass(&mut passes, self.config.current());
                }
            }

            publish_state(&state, enabled, &passes);
        }

        // In-flight passes finish on their own; a reset or newer scan discards their publishes.
        passes.detach_all();
        state.send_replace(SchedulerState::Disabled);
        tracing::info!("refresh scheduler stopped");
    }

    fn start_pass(&self, passes: &mut JoinSet<()>, config: Arc<AnnotationConfig>) {
        let pipeline = self.pipeline.clone();
        let host = self.host.clone();
        passes.spawn(async move {
            pipeline.scan_pass(host, config).await;
        });
    }
}

fn publish_state(state: &watch::Sender<SchedulerState>, enabled: bool, passes: &JoinSet<()>) {
    let next = if !enabled {
        SchedulerState::Disabled
    } else if passes.is_empty() {
        SchedulerState::Idle
    } else {
        SchedulerState::Scanning
    };
    state.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

/// Control surface of a running scheduler. Dropping it stops the loop.
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SchedulerState>,
    passes: watch::Receiver<u64>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SchedulerHandle {
    pub fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("scheduler is not running; command dropped");
        }
    }

    pub fn rescan(&self) {
        self.send(Command::Rescan);
    }

    pub fn document_closed(&self, path: PathBuf) {
        self.send(Command::DocumentClosed(path));
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    /// Number of passes that have run to completion.
    pub fn passes_completed(&self) -> u64 {
        *self.passes.borrow()
    }

    /// Wait until at least `count` passes have completed.
    pub async fn wait_for_passes(&self, count: u64) {
        let mut rx = self.passes.clone();
        // Err only if the loop is gone, in which case no more passes will come.
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(&self) {
        self.send(Command::Shutdown);
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!("scheduler task failed: {}", e);
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
