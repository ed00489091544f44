//! Immutable per-poll view of every server.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::stats::ServerRecord;

/// A server's record plus what the agent derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerState {
    pub record: ServerRecord,
    /// Share of traffic within the backend, 0–100.
    pub weight: u8,
    /// When the server was first seen continuously `DOWN`.
    pub down_since: Option<Instant>,
}

impl ServerState {
    pub fn new(record: ServerRecord, weight: u8) -> Self {
        Self {
            record,
            weight,
            down_since: None,
        }
    }

    /// Continuous downtime as of `now`; zero for servers that are not down.
    pub fn downtime(&self, now: Instant) -> Duration {
        self.down_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default()
    }
}

/// Server name → state, built from exactly one stats fetch.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    servers: HashMap<String, ServerState>,
}

impl Snapshot {
    /// The snapshot readers see before the first successful poll.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from freshly weighted states.
    ///
    /// Downtime for `DOWN` servers starts at the earliest evidence available:
    /// the feed's time-since-last-change, the previous snapshot's start if the
    /// server was already down, or `now`.
    pub fn from_states(states: Vec<ServerState>, previous: &Snapshot, now: Instant) -> Self {
        let servers = states
            .into_iter()
            .map(|mut state| {
                state.down_since = if state.record.status.is_down() {
                    let reported = state.record.last_change.and_then(|since| now.checked_sub(since));
                    let carried = previous
                        .get(&state.record.server)
                        .filter(|prev| prev.record.status.is_down())
                        .and_then(|prev| prev.down_since);
                    [reported, carried].into_iter().flatten().min().or(Some(now))
                } else {
                    None
                };
                (state.record.server.clone(), state)
            })
            .collect();

        Self { servers }
    }

    pub fn get(&self, server: &str) -> Option<&ServerState> {
        self.servers.get(server)
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerState> {
        self.servers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::state::ServerStatus;

    fn state(server: &str, status: ServerStatus) -> ServerState {
        ServerState::new(ServerRecord::new("api", server, status), 0)
    }

    #[test]
    fn new_down_server_starts_now() {
        let now = Instant::now();
        let snapshot = Snapshot::from_states(vec![state("api1", ServerStatus::Down)], &Snapshot::empty(), now);
        assert_eq!(snapshot.get("api1").unwrap().down_since, Some(now));
    }

    #[test]
    fn downtime_carries_across_polls() {
        let t0 = Instant::now();
        let first = Snapshot::from_states(vec![state("api1", ServerStatus::Down)], &Snapshot::empty(), t0);

        let t1 = t0 + Duration::from_secs(30);
        let second = Snapshot::from_states(vec![state("api1", ServerStatus::Down)], &first, t1);

        let api1 = second.get("api1").unwrap();
        assert_eq!(api1.down_since, Some(t0));
        assert_eq!(api1.downtime(t1 + Duration::from_secs(670)), Duration::from_secs(700));
    }

    #[test]
    fn recovery_clears_downtime() {
        let t0 = Instant::now();
        let down = Snapshot::from_states(vec![state("api1", ServerStatus::Down)], &Snapshot::empty(), t0);
        let up = Snapshot::from_states(vec![state("api1", ServerStatus::Up)], &down, t0 + Duration::from_secs(30));
        assert_eq!(up.get("api1").unwrap().down_since, None);

        let t2 = t0 + Duration::from_secs(60);
        let down_again = Snapshot::from_states(vec![state("api1", ServerStatus::Down)], &up, t2);
        assert_eq!(down_again.get("api1").unwrap().down_since, Some(t2));
    }

    #[test]
    fn reported_last_change_takes_precedence_when_earlier() {
        let now = Instant::now() + Duration::from_secs(3600);
        let api1 = ServerState::new(
            ServerRecord::new("api", "api1", ServerStatus::Down).with_last_change(Duration::from_secs(700)),
            0,
        );

        let snapshot = Snapshot::from_states(vec![api1], &Snapshot::empty(), now);
        assert_eq!(snapshot.get("api1").unwrap().downtime(now), Duration::from_secs(700));
    }

    #[test]
    fn empty_snapshot() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert!(snapshot.get("anything").is_none());
    }
}
