//! Agent-check wire format.
//!
//! HAProxy connects, optionally sends the configured `agent-send` string (here
//! the server name), and reads one ASCII line back. This agent answers with
//! either a weight percentage or a state directive.

use std::str::FromStr;

/// Longest request accepted from the load balancer.
pub const MAX_REQUEST_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentReply {
    /// `<n>%`: set the server's weight to n percent of its configured weight.
    Weight(u8),
    /// `ready`: take the server out of maintenance so HAProxy re-checks it.
    Ready,
    /// `maint`: put the server into maintenance.
    Maint,
}

impl AgentReply {
    /// The fail-safe reply: never drop a server to zero on our own error.
    pub const FULL_WEIGHT: AgentReply = AgentReply::Weight(100);

    /// Label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentReply::Weight(_) => "weight",
            AgentReply::Ready => "ready",
            AgentReply::Maint => "maint",
        }
    }

    /// The reply as written to the socket, newline-terminated.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl std::fmt::Display for AgentReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentReply::Weight(weight) => write!(f, "{}%", weight),
            AgentReply::Ready => f.write_str("ready"),
            AgentReply::Maint => f.write_str("maint"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReplyError(String);

impl std::fmt::Display for ParseReplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognised agent reply '{}'", self.0)
    }
}

impl std::error::Error for ParseReplyError {}

impl FromStr for AgentReply {
    type Err = ParseReplyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "ready" => Ok(AgentReply::Ready),
            "maint" => Ok(AgentReply::Maint),
            _ => s
                .strip_suffix('%')
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| *n <= 100)
                .map(AgentReply::Weight)
                .ok_or_else(|| ParseReplyError(s.to_string())),
        }
    }
}

/// Extract the server name from whatever the load balancer sent: the first
/// line, trimmed. `agent-send` may or may not include the trailing newline.
pub fn parse_request(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.lines().next().unwrap_or("").trim().to_string()
}
