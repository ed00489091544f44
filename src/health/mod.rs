//! Server health interpretation.
//!
//! # Data Flow
//! ```text
//! Stats feed status column
//!     → state.rs (UP / DOWN / other)
//!     → weight engine (excludes anything not UP)
//!     → snapshot (tracks when a server went DOWN)
//!
//! Check request for a DOWN server (maintenance.rs):
//!     downtime <= threshold → numeric weight
//!     downtime >  threshold → ready (inside daily window) | maint
//! ```
//!
//! # Design Decisions
//! - HAProxy's own health checks decide UP/DOWN; this agent only weights
//! - Long-down servers get one narrow daily chance to come back

pub mod maintenance;
pub mod state;

pub use maintenance::MaintenanceWindow;
pub use state::ServerStatus;
