//! Metrics collection and exposition.
//!
//! # Metrics
//! - `agent_poll_total` (counter): stats refreshes by outcome
//! - `agent_poll_skipped_total` (counter): ticks skipped by the post-reset cooldown
//! - `agent_reset_total` (counter): counter resets by outcome
//! - `agent_check_requests_total` (counter): check replies by kind
//! - `agent_snapshot_servers` (gauge): servers in the current snapshot
//! - `agent_server_weight` (gauge): computed weight per server, zeroed once it leaves the feed
//!
//! # Design Decisions
//! - Recording is always on; without an installed exporter the calls are no-ops
//! - Prometheus exporter is optional and serves its own HTTP listener

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

use crate::snapshot::{ServerState, Snapshot};

/// Install the Prometheus exporter on `addr`. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_poll(outcome: &'static str) {
    ::metrics::counter!("agent_poll_total", "outcome" => outcome).increment(1);
}

pub fn record_poll_skipped() {
    ::metrics::counter!("agent_poll_skipped_total").increment(1);
}

pub fn record_reset(outcome: &'static str) {
    ::metrics::counter!("agent_reset_total", "outcome" => outcome).increment(1);
}

pub fn record_check(reply: &'static str) {
    ::metrics::counter!("agent_check_requests_total", "reply" => reply).increment(1);
}

/// Publish per-server gauges for `current`.
///
/// The facade cannot unregister a series, so servers that left the feed since
/// `previous` have their weight gauge set to zero instead of going stale.
pub fn record_snapshot(previous: &Snapshot, current: &Snapshot) {
    ::metrics::gauge!("agent_snapshot_servers").set(current.len() as f64);
    for server in current.iter() {
        set_weight_gauge(server, f64::from(server.weight));
    }
    for server in departed_servers(previous, current) {
        set_weight_gauge(server, 0.0);
    }
}

/// Servers present in `previous` but missing from `current`.
pub fn departed_servers<'a>(previous: &'a Snapshot, current: &Snapshot) -> Vec<&'a ServerState> {
    previous
        .iter()
        .filter(|server| current.get(&server.record.server).is_none())
        .collect()
}

fn set_weight_gauge(server: &ServerState, value: f64) {
    ::metrics::gauge!(
        "agent_server_weight",
        "backend" => server.record.backend.clone(),
        "server" => server.record.server.clone()
    )
    .set(value);
}
