//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the agent.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the weight agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Where to reach the load balancer's stats page and admin socket.
    pub haproxy: HaproxyConfig,

    /// Check-protocol listener (the port HAProxy's agent-check polls).
    pub listener: ListenerConfig,

    /// Stats polling cadence and post-reset cooldown.
    pub polling: PollingConfig,

    /// Periodic counter reset.
    pub reset: ResetConfig,

    /// Daily re-entry window for long-down servers.
    pub maintenance: MaintenanceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Load balancer endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HaproxyConfig {
    /// Host serving both the stats page and the admin socket.
    pub host: String,

    /// Port of the HTTP stats page.
    pub stats_port: u16,

    /// Path of the CSV stats export.
    pub stats_path: String,

    /// Port of the TCP admin (runtime API) socket.
    pub admin_port: u16,

    /// Connect timeout for both stats and admin connections, in seconds.
    pub connect_timeout_secs: u64,

    /// Total stats request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How long to wait for the admin socket's reply line, in seconds.
    pub admin_read_timeout_secs: u64,

    /// Command sent to the admin socket to zero failure counters.
    pub reset_command: String,
}

impl HaproxyConfig {
    /// Full URL of the CSV stats export.
    pub fn stats_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.stats_port, self.stats_path)
    }

    /// `host:port` of the admin socket.
    pub fn admin_address(&self) -> String {
        format!("{}:{}", self.host, self.admin_port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn admin_read_timeout(&self) -> Duration {
        Duration::from_secs(self.admin_read_timeout_secs)
    }
}

impl Default for HaproxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            stats_port: 80,
            stats_path: "/stats;csv".to_string(),
            admin_port: 9999,
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
            admin_read_timeout_secs: 5,
            reset_command: "clear counters all".to_string(),
        }
    }
}

/// Check-protocol listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9099").
    pub bind_address: String,

    /// Maximum concurrent check connections (backpressure).
    pub max_connections: usize,

    /// How long to wait for the server name before answering with full weight.
    pub read_timeout_secs: u64,
}

impl ListenerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9099".to_string(),
            max_connections: 1024,
            read_timeout_secs: 5,
        }
    }
}

/// Stats polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Interval between poll ticks in seconds.
    pub interval_secs: u64,

    /// Ticks are skipped for this long after a counter reset, in seconds.
    pub cooldown_secs: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            cooldown_secs: 15 * 60,
        }
    }
}

/// Counter reset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResetConfig {
    /// Enable the periodic counter reset.
    pub enabled: bool,

    /// Interval between resets in seconds.
    pub interval_secs: u64,
}

impl ResetConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5 * 60 * 60,
        }
    }
}

/// Maintenance window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Local time the daily window opens ("HH:MM" or "HH:MM:SS").
    pub window_start: String,

    /// Local time the daily window closes (exclusive).
    pub window_end: String,

    /// Continuous downtime after which a DOWN server is held in maintenance.
    pub downtime_threshold_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            window_start: "00:00".to_string(),
            window_end: "00:10".to_string(),
            downtime_threshold_secs: 10 * 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long to wait for in-flight check connections before exiting.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AgentConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:9099");
        assert_eq!(config.polling.interval(), Duration::from_secs(30));
        assert_eq!(config.polling.cooldown(), Duration::from_secs(900));
        assert_eq!(config.reset.interval(), Duration::from_secs(18_000));
        assert_eq!(config.maintenance.downtime_threshold_secs, 600);
        assert_eq!(config.haproxy.reset_command, "clear counters all");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AgentConfig = toml::from_str(
            r#"
            [haproxy]
            host = "192.168.5.2"

            [polling]
            interval_secs = 10

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.haproxy.stats_url(), "http://192.168.5.2:80/stats;csv");
        assert_eq!(config.haproxy.admin_address(), "192.168.5.2:9999");
        assert_eq!(config.polling.interval_secs, 10);
        assert_eq!(config.polling.cooldown_secs, 900);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
