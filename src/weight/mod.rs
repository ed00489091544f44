//! Weight computation.
//!
//! # Data Flow
//! ```text
//! Vec<ServerRecord> (one poll)
//!     → group by backend
//!     → engine.rs (exclusion, healthy-group shortcut, inverse-failure share)
//!     → Vec<ServerState> (weight 0–100 each)
//! ```
//!
//! # Design Decisions
//! - Pure function: no I/O, no clock, no hidden state
//! - Shares are rounded independently; a group need not sum to exactly 100

pub mod engine;

pub use engine::{compute_weights, FULL_WEIGHT};
