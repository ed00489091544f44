//! Server status as reported by the load balancer.
//!
//! # States
//! - `UP`: server is in rotation and may be weighted
//! - `DOWN`: the load balancer's own checks failed; downtime is tracked
//! - anything else (`MAINT`, `NOLB`, `DRAIN`, transitional `UP 1/3`, ...)
//!
//! # Design Decisions
//! - Matching is exact: a transitional `UP 1/3` is not `UP`
//! - Unknown statuses are preserved verbatim for logging

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServerStatus {
    Up,
    Down,
    Other(String),
}

impl ServerStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "UP" => ServerStatus::Up,
            "DOWN" => ServerStatus::Down,
            other => ServerStatus::Other(other.to_string()),
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, ServerStatus::Up)
    }

    pub fn is_down(&self) -> bool {
        matches!(self, ServerStatus::Down)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServerStatus::Up => "UP",
            ServerStatus::Down => "DOWN",
            ServerStatus::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
