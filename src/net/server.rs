//! Agent-check server.
//!
//! # Responsibilities
//! - Accept one connection per HAProxy agent check
//! - Read the server name, look it up in the current snapshot, answer once
//! - Stop accepting on shutdown; in-flight connections finish their reply
//!
//! # Design Decisions
//! - Read errors and timeouts answer `100%`: our own hiccup must not zero a server
//! - Before the first poll succeeds nothing is answered; HAProxy keeps its default
//! - Unknown server names answer `100%`

use chrono::{Local, NaiveTime};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::{timeout, Instant};
use thiserror::Error;

use crate::health::MaintenanceWindow;
use crate::net::connection::{ConnectionGuard, ConnectionState, ConnectionTracker};
use crate::net::listener::{ConnectionPermit, Listener};
use crate::net::protocol::{parse_request, AgentReply, MAX_REQUEST_LEN};
use crate::observability::metrics;
use crate::snapshot::{SharedState, Snapshot};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to read check request: {0}")]
    Read(#[source] std::io::Error),
    #[error("check request timed out after {0:?}")]
    ReadTimeout(Duration),
    #[error("connection closed before a server name was sent")]
    EmptyRequest,
    #[error("failed to write check reply: {0}")]
    Write(#[source] std::io::Error),
}

/// Decide the reply for `server`, or `None` if nothing has been published yet.
pub fn resolve_reply(
    snapshot: &Snapshot,
    server: &str,
    window: &MaintenanceWindow,
    now: Instant,
    local_time: NaiveTime,
) -> Option<AgentReply> {
    if snapshot.is_empty() {
        return None;
    }

    let Some(state) = snapshot.get(server) else {
        return Some(AgentReply::FULL_WEIGHT);
    };

    Some(
        window
            .directive(state, now, local_time)
            .unwrap_or(AgentReply::Weight(state.weight)),
    )
}

/// What each connection task needs; shared read-only.
#[derive(Debug)]
struct Responder {
    state: Arc<SharedState>,
    window: MaintenanceWindow,
    read_timeout: Duration,
}

impl Responder {
    async fn read_request(&self, stream: &mut TcpStream) -> Result<String, CheckError> {
        let mut buf = [0u8; MAX_REQUEST_LEN];
        let read = timeout(self.read_timeout, stream.read(&mut buf))
            .await
            .map_err(|_| CheckError::ReadTimeout(self.read_timeout))?
            .map_err(CheckError::Read)?;

        if read == 0 {
            return Err(CheckError::EmptyRequest);
        }
        Ok(parse_request(&buf[..read]))
    }

    async fn handle(&self, mut stream: TcpStream, peer: SocketAddr, guard: &ConnectionGuard) -> ConnectionState {
        let connection_id = guard.id();
        tracing::trace!(connection_id = %connection_id, peer_addr = %peer, state = %ConnectionState::Reading, "Reading check request");

        let (reply, outcome) = match self.read_request(&mut stream).await {
            Ok(server) => {
                let snapshot = self.state.snapshot();
                match resolve_reply(&snapshot, &server, &self.window, Instant::now(), Local::now().time()) {
                    Some(reply) => {
                        tracing::debug!(connection_id = %connection_id, server = %server, reply = %reply, "Check answered");
                        (reply, ConnectionState::Responded)
                    }
                    None => {
                        tracing::warn!(
                            connection_id = %connection_id,
                            server = %server,
                            "No stats snapshot published yet, leaving check unanswered"
                        );
                        metrics::record_check("unanswered");
                        return ConnectionState::Unanswered;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, peer_addr = %peer, error = %e, "Check request failed, answering full weight");
                (AgentReply::FULL_WEIGHT, ConnectionState::TimedOut)
            }
        };

        metrics::record_check(reply.kind());
        if let Err(e) = write_reply(&mut stream, reply).await {
            tracing::debug!(connection_id = %connection_id, error = %e, "Check reply not delivered");
        }
        outcome
    }
}

async fn write_reply(stream: &mut TcpStream, reply: AgentReply) -> Result<(), CheckError> {
    stream.write_all(reply.to_line().as_bytes()).await.map_err(CheckError::Write)?;
    stream.shutdown().await.map_err(CheckError::Write)
}

/// Pause before retrying a failed accept. Errors like EMFILE repeat on every call.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Wait out the accept backoff. Returns false if shutdown arrived first.
async fn pause_after_accept_error(shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => true,
        _ = shutdown.recv() => false,
    }
}

/// Serves agent checks against the shared snapshot.
pub struct CheckServer {
    responder: Arc<Responder>,
    tracker: ConnectionTracker,
}

impl CheckServer {
    pub fn new(state: Arc<SharedState>, window: MaintenanceWindow, read_timeout: Duration) -> Self {
        Self {
            responder: Arc::new(Responder {
                state,
                window,
                read_timeout,
            }),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Handle for waiting on in-flight connections after `run` returns.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until shutdown. The listener is dropped on return.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Check server starting");
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer, permit)) => self.spawn_connection(stream, peer, permit),
                        Err(e) => {
                            tracing::warn!(error = %e, backoff_ms = ACCEPT_ERROR_BACKOFF.as_millis() as u64, "Accept failed");
                            if !pause_after_accept_error(&mut shutdown).await {
                                tracing::info!("Check server received shutdown signal during accept backoff");
                                break;
                            }
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!(
                        in_flight = self.tracker.active_count(),
                        "Check server received shutdown signal, no longer accepting"
                    );
                    break;
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let responder = Arc::clone(&self.responder);
        tracing::trace!(connection_id = %guard.id(), peer_addr = %peer, state = %ConnectionState::Accepted, "Check connection accepted");

        tokio::spawn(async move {
            let _permit = permit;
            let outcome = responder.handle(stream, peer, &guard).await;
            tracing::trace!(connection_id = %guard.id(), state = %outcome, "Check connection finished");
        });
    }
}
