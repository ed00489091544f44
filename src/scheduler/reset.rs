//! Periodic counter reset.
//!
//! # Responsibilities
//! - Send the reset command on a fixed cadence
//! - Start the polling cooldown only when the reset actually succeeded

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::admin::AdminChannel;
use crate::config::ResetConfig;
use crate::observability::metrics;
use crate::snapshot::SharedState;

pub struct ResetScheduler<A> {
    channel: A,
    state: Arc<SharedState>,
    interval: Duration,
    command: String,
}

impl<A: AdminChannel> ResetScheduler<A> {
    pub fn new(channel: A, state: Arc<SharedState>, config: &ResetConfig, command: impl Into<String>) -> Self {
        Self {
            channel,
            state,
            interval: config.interval(),
            command: command.into(),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            command = %self.command,
            "Reset scheduler starting"
        );

        // First reset happens one full interval after startup.
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reset().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reset scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Send the reset command. Returns true if the reset marker was advanced.
    pub async fn reset(&self) -> bool {
        match self.channel.send(&self.command).await {
            Ok(reply) => {
                self.state.mark_reset(Instant::now());
                tracing::info!(command = %self.command, reply = %reply, "Counters reset, polling cooldown started");
                metrics::record_reset("ok");
                true
            }
            Err(e) => {
                tracing::warn!(command = %self.command, error = %e, "Counter reset failed, cooldown not started");
                metrics::record_reset("error");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminError;
    use crate::lifecycle::Shutdown;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingChannel {
        fail: bool,
        commands: Arc<Mutex<Vec<String>>>,
    }

    impl AdminChannel for RecordingChannel {
        async fn send(&self, command: &str) -> Result<String, AdminError> {
            self.commands.lock().unwrap().push(command.to_string());
            if self.fail {
                Err(AdminError::Closed)
            } else {
                Ok(String::new())
            }
        }
    }

    #[tokio::test]
    async fn success_advances_marker() {
        let state = Arc::new(SharedState::new());
        let channel = RecordingChannel::default();
        let commands = channel.commands.clone();
        let scheduler = ResetScheduler::new(channel, state.clone(), &ResetConfig::default(), "clear counters all");

        let before = Instant::now();
        assert!(scheduler.reset().await);
        assert!(state.last_reset().is_some_and(|at| at >= before));
        assert_eq!(*commands.lock().unwrap(), vec!["clear counters all".to_string()]);
    }

    #[tokio::test]
    async fn failure_leaves_marker_unset() {
        let state = Arc::new(SharedState::new());
        let channel = RecordingChannel {
            fail: true,
            ..Default::default()
        };
        let scheduler = ResetScheduler::new(channel, state.clone(), &ResetConfig::default(), "clear counters all");

        assert!(!scheduler.reset().await);
        assert_eq!(state.last_reset(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn first_reset_waits_one_interval() {
        let state = Arc::new(SharedState::new());
        let channel = RecordingChannel::default();
        let commands = channel.commands.clone();
        let scheduler = ResetScheduler::new(channel, state.clone(), &ResetConfig::default(), "clear counters all");
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(scheduler.run(shutdown.subscribe()));

        time::sleep(Duration::from_secs(60)).await;
        assert!(commands.lock().unwrap().is_empty());

        time::sleep(Duration::from_secs(5 * 60 * 60)).await;
        assert_eq!(commands.lock().unwrap().len(), 1);
        assert!(state.last_reset().is_some());

        shutdown.trigger();
        handle.await.unwrap();
    }
}
