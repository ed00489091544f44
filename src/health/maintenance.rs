//! Daily maintenance window for long-down servers.
//!
//! A server that has been `DOWN` for longer than the downtime threshold is
//! presumed to need operator attention and is held out with `maint`. Once a
//! day, inside the window, it is answered with `ready` instead so HAProxy can
//! re-probe it without anyone restarting this agent.

use chrono::{NaiveTime, ParseError};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::MaintenanceConfig;
use crate::net::protocol::AgentReply;
use crate::snapshot::ServerState;

/// Parse "HH:MM" or "HH:MM:SS".
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ParseError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceWindow {
    start: NaiveTime,
    end: NaiveTime,
    downtime_threshold: Duration,
}

impl MaintenanceWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, downtime_threshold: Duration) -> Self {
        Self {
            start,
            end,
            downtime_threshold,
        }
    }

    pub fn from_config(config: &MaintenanceConfig) -> Result<Self, ParseError> {
        Ok(Self::new(
            parse_time_of_day(&config.window_start)?,
            parse_time_of_day(&config.window_end)?,
            Duration::from_secs(config.downtime_threshold_secs),
        ))
    }

    /// Whether `time` falls in `[start, end)`. A window whose end is before
    /// its start wraps past midnight.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }

    /// The directive for a long-down server, or `None` when the rule does not apply.
    pub fn directive(&self, state: &ServerState, now: Instant, local_time: NaiveTime) -> Option<AgentReply> {
        if !state.record.status.is_down() || state.downtime(now) <= self.downtime_threshold {
            return None;
        }

        if self.contains(local_time) {
            Some(AgentReply::Ready)
        } else {
            Some(AgentReply::Maint)
        }
    }
}
