//! HAProxy weight agent.
//!
//! Steers HAProxy traffic away from failing servers by answering its
//! `agent-check` probes with a per-server weight.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                      WEIGHT AGENT                        │
//!                 │                                                          │
//!   HAProxy       │  ┌──────────┐   ┌────────────┐   ┌──────────────┐        │
//!   /stats;csv ◀──┼──│  stats   │◀──│  polling   │──▶│    weight    │        │
//!                 │  │  source  │   │ scheduler  │   │    engine    │        │
//!                 │  └──────────┘   └─────┬──────┘   └──────┬───────┘        │
//!                 │                       │ cooldown        │                │
//!                 │                       ▼                 ▼                │
//!   HAProxy       │  ┌──────────┐   ┌────────────┐   ┌──────────────┐        │
//!   admin    ◀────┼──│  admin   │◀──│   reset    │──▶│ SharedState  │        │
//!   socket        │  │ channel  │   │ scheduler  │   │  (snapshot)  │        │
//!                 │  └──────────┘   └────────────┘   └──────┬───────┘        │
//!                 │                                         │ read-only      │
//!   HAProxy       │  ┌──────────┐   ┌────────────┐          │                │
//!   agent-check ──┼─▶│ listener │──▶│   check    │◀─────────┘                │
//!                 │  └──────────┘   │   server   │── `80%` / ready / maint   │
//!                 │                 └────────────┘                           │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use weight_agent::admin::SocketAdminChannel;
use weight_agent::config::loader::load_or_default;
use weight_agent::lifecycle::signals::wait_for_signal;
use weight_agent::net::Listener;
use weight_agent::observability::{logging, metrics};
use weight_agent::stats::HttpStatsSource;
use weight_agent::Agent;

#[derive(Parser)]
#[command(name = "weight-agent")]
#[command(about = "Serves HAProxy agent-check weights derived from live stats", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the check listener bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HAProxy host for stats and admin access
    #[arg(long)]
    haproxy_host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(host) = cli.haproxy_host {
        config.haproxy.host = host;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "weight-agent starting");
    tracing::info!(
        stats_url = %config.haproxy.stats_url(),
        admin_address = %config.haproxy.admin_address(),
        bind_address = %config.listener.bind_address,
        poll_interval_secs = config.polling.interval_secs,
        cooldown_secs = config.polling.cooldown_secs,
        reset_interval_secs = config.reset.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;
    let source = HttpStatsSource::new(&config.haproxy)?;
    let channel = SocketAdminChannel::from_config(&config.haproxy);

    Agent::new(config)?.run(listener, source, channel, wait_for_signal()).await;
    Ok(())
}
