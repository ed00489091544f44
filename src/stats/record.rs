//! Per-server telemetry record.

use std::time::Duration;

use crate::health::state::ServerStatus;

/// Weight reported when the feed has no usable `weight` column.
pub const DEFAULT_LB_WEIGHT: u32 = 50;

/// Response errors above this exclude a server outright.
pub const RESPONSE_ERROR_LIMIT: u64 = 3;

/// One server's counters from a single stats fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRecord {
    /// Backend (`pxname`) the server belongs to.
    pub backend: String,
    /// Server name (`svname`), unique across the load balancer.
    pub server: String,
    pub status: ServerStatus,
    /// Weight currently configured on the load balancer.
    pub lb_weight: u32,
    /// Failed health checks (`chkfail`).
    pub check_failures: u64,
    /// Requests redispatched to another server (`wredis`).
    pub redispatches: u64,
    /// Connection retries (`wretr`).
    pub retries: u64,
    /// Response errors (`eresp`).
    pub response_errors: u64,
    /// Time since the last UP/DOWN transition (`lastchg`), when reported.
    pub last_change: Option<Duration>,
}

impl ServerRecord {
    pub fn new(backend: impl Into<String>, server: impl Into<String>, status: ServerStatus) -> Self {
        Self {
            backend: backend.into(),
            server: server.into(),
            status,
            lb_weight: DEFAULT_LB_WEIGHT,
            check_failures: 0,
            redispatches: 0,
            retries: 0,
            response_errors: 0,
            last_change: None,
        }
    }

    pub fn with_redispatches(mut self, count: u64) -> Self {
        self.redispatches = count;
        self
    }

    pub fn with_retries(mut self, count: u64) -> Self {
        self.retries = count;
        self
    }

    pub fn with_response_errors(mut self, count: u64) -> Self {
        self.response_errors = count;
        self
    }

    pub fn with_last_change(mut self, since: Duration) -> Self {
        self.last_change = Some(since);
        self
    }

    /// Accumulated failures that count against this server's share.
    pub fn error_signal(&self) -> u64 {
        self.redispatches
            .saturating_add(self.retries)
            .saturating_add(self.response_errors)
    }

    /// Excluded servers never receive traffic, however the group scores.
    pub fn is_excluded(&self) -> bool {
        !self.status.is_up() || self.response_errors > RESPONSE_ERROR_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_signal_ignores_check_failures() {
        let mut record = ServerRecord::new("web", "web1", ServerStatus::Up)
            .with_redispatches(1)
            .with_retries(2)
            .with_response_errors(3);
        record.check_failures = 40;
        assert_eq!(record.error_signal(), 6);
    }

    #[test]
    fn exclusion_rules() {
        assert!(!ServerRecord::new("web", "a", ServerStatus::Up).with_response_errors(3).is_excluded());
        assert!(ServerRecord::new("web", "a", ServerStatus::Up).with_response_errors(4).is_excluded());
        assert!(ServerRecord::new("web", "a", ServerStatus::Down).is_excluded());
        assert!(ServerRecord::new("web", "a", ServerStatus::parse("MAINT")).is_excluded());
    }
}
