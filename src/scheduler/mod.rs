//! Periodic background tasks.
//!
//! # Data Flow
//! ```text
//! PollingScheduler (polling.rs), every 30s:
//!     cooldown check (last reset > 15m ago, or nothing served yet)
//!     → StatsSource::fetch → compute_weights → SharedState::publish
//!
//! ResetScheduler (reset.rs), every 5h:
//!     AdminChannel::send("clear counters all")
//!     → on success: SharedState::mark_reset(now)
//! ```
//!
//! # Design Decisions
//! - Each scheduler is one task with its own timer and a shutdown receiver
//! - A cycle in progress finishes before shutdown is observed
//! - Failures are logged and retried on the next tick; nothing here is fatal

pub mod polling;
pub mod reset;

pub use polling::{should_refresh, PollingScheduler};
pub use reset::ResetScheduler;
