//! Load balancer statistics feed.
//!
//! # Data Flow
//! ```text
//! GET http://<haproxy>/stats;csv
//!     → source.rs (HTTP fetch with timeouts)
//!     → decode.rs (header-indexed CSV, aggregates skipped)
//!     → Vec<ServerRecord> (record.rs)
//!     → weight engine
//! ```
//!
//! # Design Decisions
//! - Missing or unparsable counters default to 0, weight to 50
//! - Records are immutable once decoded; every poll builds fresh ones

pub mod decode;
pub mod record;
pub mod source;

pub use record::ServerRecord;
pub use source::{HttpStatsSource, StatsError, StatsSource};
