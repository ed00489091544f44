//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid)
//! - Check the maintenance window parses and is non-empty
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AgentConfig;
use crate::health::maintenance::parse_time_of_day;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.haproxy.host.trim().is_empty() {
        errors.push(ValidationError::new("haproxy.host", "must not be empty"));
    }
    if config.haproxy.stats_port == 0 {
        errors.push(ValidationError::new("haproxy.stats_port", "must be non-zero"));
    }
    if config.haproxy.admin_port == 0 {
        errors.push(ValidationError::new("haproxy.admin_port", "must be non-zero"));
    }
    if !config.haproxy.stats_path.starts_with('/') {
        errors.push(ValidationError::new("haproxy.stats_path", "must start with '/'"));
    }
    if config.haproxy.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("haproxy.connect_timeout_secs", "must be greater than 0"));
    }
    if config.haproxy.request_timeout_secs == 0 {
        errors.push(ValidationError::new("haproxy.request_timeout_secs", "must be greater than 0"));
    }
    if config.haproxy.admin_read_timeout_secs == 0 {
        errors.push(ValidationError::new("haproxy.admin_read_timeout_secs", "must be greater than 0"));
    }
    if config.haproxy.reset_command.trim().is_empty() {
        errors.push(ValidationError::new("haproxy.reset_command", "must not be empty"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }
    if config.listener.read_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.read_timeout_secs", "must be greater than 0"));
    }

    if config.polling.interval_secs == 0 {
        errors.push(ValidationError::new("polling.interval_secs", "must be greater than 0"));
    }
    if config.reset.enabled && config.reset.interval_secs == 0 {
        errors.push(ValidationError::new("reset.interval_secs", "must be greater than 0"));
    }

    let start = parse_time_of_day(&config.maintenance.window_start);
    let end = parse_time_of_day(&config.maintenance.window_end);
    if start.is_err() {
        errors.push(ValidationError::new(
            "maintenance.window_start",
            format!("'{}' is not HH:MM or HH:MM:SS", config.maintenance.window_start),
        ));
    }
    if end.is_err() {
        errors.push(ValidationError::new(
            "maintenance.window_end",
            format!("'{}' is not HH:MM or HH:MM:SS", config.maintenance.window_end),
        ));
    }
    if let (Ok(start), Ok(end)) = (start, end) {
        if start == end {
            errors.push(ValidationError::new("maintenance.window_end", "window must not be empty"));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not one of {:?}", config.observability.log_level, LOG_LEVELS),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
