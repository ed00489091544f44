//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the shared state and every background task from configuration
//! - Run until the shutdown future resolves
//! - Stop schedulers and the listener, then drain in-flight check connections
//!
//! # Design Decisions
//! - Fail fast: configuration errors surface before anything is spawned
//! - The check listener is bound by the caller so bind errors are fatal at startup
//! - Shutdown is bounded by the drain timeout

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::admin::AdminChannel;
use crate::config::AgentConfig;
use crate::health::MaintenanceWindow;
use crate::lifecycle::Shutdown;
use crate::net::{CheckServer, Listener};
use crate::scheduler::{PollingScheduler, ResetScheduler};
use crate::snapshot::SharedState;
use crate::stats::StatsSource;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid maintenance window: {0}")]
    MaintenanceWindow(#[from] chrono::ParseError),
}

/// The running agent: two schedulers and the check server around one shared state.
pub struct Agent {
    config: AgentConfig,
    state: Arc<SharedState>,
    window: MaintenanceWindow,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self, StartupError> {
        let window = MaintenanceWindow::from_config(&config.maintenance)?;
        Ok(Self {
            config,
            state: Arc::new(SharedState::new()),
            window,
        })
    }

    /// The shared state, for inspection.
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Run every task until `signal` resolves, then shut down gracefully.
    pub async fn run<S, A, F>(self, listener: Listener, source: S, channel: A, signal: F)
    where
        S: StatsSource,
        A: AdminChannel,
        F: Future<Output = ()>,
    {
        let shutdown = Shutdown::new();
        let mut tasks = JoinSet::new();

        let poller = PollingScheduler::new(source, Arc::clone(&self.state), &self.config.polling);
        tasks.spawn(poller.run(shutdown.subscribe()));

        if self.config.reset.enabled {
            let resetter = ResetScheduler::new(
                channel,
                Arc::clone(&self.state),
                &self.config.reset,
                self.config.haproxy.reset_command.clone(),
            );
            tasks.spawn(resetter.run(shutdown.subscribe()));
        } else {
            tracing::info!("Counter reset disabled");
        }

        let server = CheckServer::new(Arc::clone(&self.state), self.window, self.config.listener.read_timeout());
        let connections = server.tracker();
        tasks.spawn(server.run(listener, shutdown.subscribe()));

        tracing::info!("Agent running");
        signal.await;

        tracing::info!("Shutdown requested, stopping background tasks");
        shutdown.trigger();
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Background task ended abnormally");
            }
        }

        let drain_timeout = Duration::from_secs(self.config.shutdown.drain_timeout_secs);
        if tokio::time::timeout(drain_timeout, connections.wait_for_drain()).await.is_err() {
            tracing::warn!(
                remaining = connections.active_count(),
                drain_timeout_secs = drain_timeout.as_secs(),
                "Drain timeout elapsed with check connections still open"
            );
        }

        tracing::info!("Shutdown complete");
    }
}
