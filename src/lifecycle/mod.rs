//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → SharedState → spawn PollingScheduler, ResetScheduler, CheckServer
//!
//! Shutdown (shutdown.rs):
//!     Signal received → schedulers stop ticking → listener stops accepting
//!     → in-flight check connections drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then state, then tasks
//! - Shutdown has timeout: exit after the drain deadline regardless

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::Agent;
