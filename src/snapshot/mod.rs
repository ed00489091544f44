//! Shared snapshot of computed weights.
//!
//! # Data Flow
//! ```text
//! PollingScheduler ──publish(Snapshot)──▶ SharedState ◀──snapshot()── check connections
//! ResetScheduler ──mark_reset(now)──────▶ SharedState ◀──last_reset()── PollingScheduler
//! ```
//!
//! # Design Decisions
//! - Snapshots are never mutated in place; each poll builds and swaps a new one
//! - `arc_swap` gives readers a point-in-time view without blocking writers
//! - Downtime is tracked by carrying `down_since` from one snapshot to the next

pub mod state;
pub mod store;

pub use state::{ServerState, Snapshot};
pub use store::SharedState;
