//! HAProxy agent-check weight service library.

pub mod admin;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod scheduler;
pub mod snapshot;
pub mod stats;
pub mod weight;

pub use config::schema::AgentConfig;
pub use lifecycle::{Agent, Shutdown};
pub use snapshot::SharedState;
