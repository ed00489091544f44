//! Check-protocol network layer.
//!
//! # Data Flow
//! ```text
//! HAProxy agent-check connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking for drain)
//!     → server.rs (read name → resolve against snapshot → one reply)
//!     → protocol.rs (`<n>%` | `ready` | `maint`)
//!
//! Connection States:
//!     Accepted → Reading → Responded | TimedOut | Unanswered → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Strictly one request and one reply per connection

pub mod connection;
pub mod listener;
pub mod protocol;
pub mod server;

pub use listener::Listener;
pub use protocol::AgentReply;
pub use server::CheckServer;
