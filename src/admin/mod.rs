//! Load balancer admin channel.
//!
//! # Data Flow
//! ```text
//! ResetScheduler tick
//!     → AdminChannel::send("clear counters all")
//!     → socket.rs: connect (timeout) → write line → read one line (timeout) → close
//!     → reply or AdminError
//! ```
//!
//! # Design Decisions
//! - No persistent connection; HAProxy closes the socket after each command
//! - Every failure stage has its own variant, but callers treat them alike

pub mod socket;

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub use socket::SocketAdminChannel;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("failed to connect to admin socket: {0}")]
    Connect(#[source] std::io::Error),
    #[error("admin socket connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("failed to write admin command: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to read admin reply: {0}")]
    Read(#[source] std::io::Error),
    #[error("admin reply timed out after {0:?}")]
    ReadTimeout(Duration),
    #[error("admin socket closed without a reply")]
    Closed,
}

/// Sends one command and returns the load balancer's one-line reply.
pub trait AdminChannel: Send + Sync + 'static {
    fn send(&self, command: &str) -> impl Future<Output = Result<String, AdminError>> + Send;
}
