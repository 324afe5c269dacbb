//! Owner of the process-wide annotation index.
//!
//! Readers get cheap `Arc` snapshots; writers build a new index and swap it in.
//! Every scan takes a [`ScanTicket`] up front, and a publish is discarded when a
//! newer scan of the same file has started since, or when the index was reset.

use crate::classifier::Classifier;
use alphabeta_api::{AnnotationIndex, Document, FileAnnotationSet, HoverContent, Position};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

pub type SubscriberResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Subscriber = Arc<dyn Fn(Arc<AnnotationIndex>) -> SubscriberResult + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Proof that a scan was started; required to publish its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTicket {
    path: PathBuf,
    epoch: u64,
    generation: u64,
}

impl ScanTicket {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct Aggregator {
    current: RwLock<Arc<AnnotationIndex>>,
    /// Serializes writers so subscribers see snapshots in publish order.
    publish_lock: Mutex<()>,
    epoch: AtomicU64,
    generations: DashMap<PathBuf, u64>,
    subscribers: RwLock<BTreeMap<SubscriptionId, Subscriber>>,
    next_subscription: AtomicU64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(AnnotationIndex::new())),
            publish_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
            generations: DashMap::new(),
            subscribers: RwLock::new(BTreeMap::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Classify every position and bucket the hits by phase.
    pub fn aggregate(
        classifier: &Classifier,
        document: &Document,
        positions: &[Position],
        hovers: &[Vec<HoverContent>],
    ) -> FileAnnotationSet {
        let mut set = FileAnnotationSet::new();
        for (position, hovers) in positions.iter().zip(hovers) {
            if let Some(annotated) = classifier.classify(*position, hovers, document) {
                set.push(annotated);
            }
        }
        set
    }

    /// Register a consumer. Subscribers run synchronously, in registration
    /// order, after every change to the index. They must not publish.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(Arc<AnnotationIndex>) -> SubscriberResult + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(handler));
        id
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Snapshot of the index (cheap Arc clone).
    pub fn current_index(&self) -> Arc<AnnotationIndex> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn file_annotations(&self, path: &Path) -> Option<Arc<FileAnnotationSet>> {
        self.current_index().get(path).cloned()
    }

    /// Start a scan of `path`, superseding any scan of it still in flight.
    pub fn begin_scan(&self, path: &Path) -> ScanTicket {
        let mut entry = self.generations.entry(path.to_path_buf()).or_insert(0);
        *entry += 1;
        ScanTicket {
            path: path.to_path_buf(),
            epoch: self.epoch.load(Ordering::Acquire),
            generation: *entry,
        }
    }

    /// Replace the entry for the ticket's file and notify subscribers.
    /// Returns `false` when the ticket is stale and the result was dropped.
    pub fn publish(&self, ticket: ScanTicket, set: FileAnnotationSet) -> bool {
        let _guard = self.publish_lock.lock().unwrap_or_else(|e| e.into_inner());

        if !self.is_latest(&ticket) {
            tracing::debug!(
                path = %ticket.path.display(),
                generation = ticket.generation,
                "discarding stale scan result"
            );
            return false;
        }

        let snapshot = self.swap(|index| {
            index.insert(ticket.path.clone(), Arc::new(set));
        });
        self.notify(snapshot);
        true
    }

    /// Drop the entry for a file that went away and invalidate its in-flight scans.
    pub fn evict(&self, path: &Path) -> bool {
        let _guard = self.publish_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(mut generation) = self.generations.get_mut(path) {
            *generation += 1;
        }

        if !self.current_index().contains(path) {
            return false;
        }
        let snapshot = self.swap(|index| {
            index.remove(path);
        });
        self.notify(snapshot);
        true
    }

    /// Discard the whole index. Scans started before the reset can no longer publish.
    pub fn reset(&self) {
        let _guard = self.publish_lock.lock().unwrap_or_else(|e| e.into_inner());

        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.generations.clear();
        let snapshot = Arc::new(AnnotationIndex::new());
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = snapshot.clone();
        self.notify(snapshot);
    }

    /// Whether a publish on `ticket` would still be accepted.
    pub fn is_current(&self, ticket: &ScanTicket) -> bool {
        self.is_latest(ticket)
    }

    fn is_latest(&self, ticket: &ScanTicket) -> bool {
        ticket.epoch == self.epoch.load(Ordering::Acquire)
            && self
                .generations
                .get(&ticket.path)
                .is_some_and(|g| *g == ticket.generation)
    }

    fn swap(&self, edit: impl FnOnce(&mut AnnotationIndex)) -> Arc<AnnotationIndex> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let mut next = (**current).clone();
        edit(&mut next);
        let snapshot = Arc::new(next);
        *current = snapshot.clone();
        snapshot
    }

    fn notify(&self, snapshot: Arc<AnnotationIndex>) {
        let subscribers: Vec<(SubscriptionId, Subscriber)> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, s)| (*id, s.clone()))
            .collect();

        for (id, subscriber) in subscribers {
            let index = snapshot.clone();
            match catch_unwind(AssertUnwindSafe(|| subscriber(index))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(subscription = id.0, "subscriber failed: {}", e),
                Err(_) => tracing::error!(subscription = id.0, "subscriber panicked"),
            }
        }
    }
}
