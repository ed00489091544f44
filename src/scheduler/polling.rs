//! Stats polling with post-reset cooldown.
//!
//! # Responsibilities
//! - Fetch, weigh and publish immediately on startup
//! - Refresh on every tick unless a counter reset happened within the cooldown
//! - Keep the previous snapshot when a refresh fails

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::PollingConfig;
use crate::observability::metrics;
use crate::snapshot::{SharedState, Snapshot};
use crate::stats::StatsSource;
use crate::weight::compute_weights;

/// Whether a poll tick at `now` should refresh.
///
/// Right after a counter reset every server reports near-zero errors, which
/// would read as "fully healthy"; ticks inside the cooldown are skipped unless
/// there is nothing to serve yet.
pub fn should_refresh(snapshot: &Snapshot, last_reset: Option<Instant>, now: Instant, cooldown: Duration) -> bool {
    if snapshot.is_empty() {
        return true;
    }
    match last_reset {
        None => true,
        Some(reset_at) => now.saturating_duration_since(reset_at) > cooldown,
    }
}

pub struct PollingScheduler<S> {
    source: S,
    state: Arc<SharedState>,
    interval: Duration,
    cooldown: Duration,
}

impl<S: StatsSource> PollingScheduler<S> {
    pub fn new(source: S, state: Arc<SharedState>, config: &PollingConfig) -> Self {
        Self {
            source,
            state,
            interval: config.interval(),
            cooldown: config.cooldown(),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            cooldown_secs = self.cooldown.as_secs(),
            "Polling scheduler starting"
        );

        self.refresh().await;

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Polling scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// One scheduled tick. Returns true if a new snapshot was published.
    pub async fn tick(&self) -> bool {
        let now = Instant::now();
        let last_reset = self.state.last_reset();

        if !should_refresh(&self.state.snapshot(), last_reset, now, self.cooldown) {
            let since_reset = last_reset.map(|at| now.saturating_duration_since(at)).unwrap_or_default();
            tracing::debug!(
                since_reset_secs = since_reset.as_secs(),
                cooldown_secs = self.cooldown.as_secs(),
                "Within post-reset cooldown, skipping refresh"
            );
            metrics::record_poll_skipped();
            return false;
        }

        self.refresh().await
    }

    /// Fetch, weigh and publish. Returns true if a new snapshot was published.
    pub async fn refresh(&self) -> bool {
        match self.source.fetch().await {
            Ok(records) => {
                let previous = self.state.snapshot();
                let snapshot = Snapshot::from_states(compute_weights(records), &previous, Instant::now());

                for server in snapshot.iter() {
                    tracing::trace!(
                        backend = %server.record.backend,
                        server = %server.record.server,
                        status = %server.record.status,
                        weight = server.weight,
                        "Server weighed"
                    );
                }
                tracing::info!(servers = snapshot.len(), "Snapshot published");

                metrics::record_poll("ok");
                metrics::record_snapshot(&previous, &snapshot);
                self.state.publish(snapshot);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stats refresh failed, keeping previous snapshot");
                metrics::record_poll(e.kind());
                false
            }
        }
    }
}
