//! Shared state with lock-free publication.

use arc_swap::{ArcSwap, ArcSwapOption};
use std::sync::Arc;
use tokio::time::Instant;

use crate::snapshot::state::Snapshot;

/// The snapshot and reset marker shared between schedulers and check connections.
///
/// Both are replaced whole by pointer swap, so a reader holding an
/// `Arc<Snapshot>` keeps a consistent view while the poller publishes the next one.
#[derive(Debug)]
pub struct SharedState {
    snapshot: ArcSwap<Snapshot>,
    last_reset: ArcSwapOption<Instant>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::empty()),
            last_reset: ArcSwapOption::empty(),
        }
    }

    /// Current snapshot; cheap to call from every connection.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Atomically replace the snapshot. Only the polling scheduler calls this.
    pub fn publish(&self, snapshot: Snapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Time of the last successful counter reset.
    pub fn last_reset(&self) -> Option<Instant> {
        self.last_reset.load_full().map(|at| *at)
    }

    /// Record a successful counter reset. Only the reset scheduler calls this.
    pub fn mark_reset(&self, at: Instant) {
        self.last_reset.store(Some(Arc::new(at)));
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
