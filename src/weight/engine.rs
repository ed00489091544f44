//! Inverse-failure weighting per backend group.

use std::collections::HashMap;

use crate::snapshot::ServerState;
use crate::stats::ServerRecord;

/// A group whose total error signal stays at or below this is treated as healthy.
pub const HEALTHY_GROUP_ERROR_LIMIT: u64 = 1;

/// Weight given to every included server of a healthy group.
pub const FULL_WEIGHT: u8 = 100;

/// Compute a weight for every record, preserving input order.
///
/// Records are grouped by backend. Within a group, excluded servers (not
/// `UP`, or too many response errors) always get 0. If the group's combined
/// error signal is at most [`HEALTHY_GROUP_ERROR_LIMIT`] the remaining
/// servers all get 100; otherwise each gets its share of
/// `1 / (error_signal + 1)`, rounded half away from zero.
pub fn compute_weights(records: Vec<ServerRecord>) -> Vec<ServerState> {
    let mut weights = vec![0u8; records.len()];

    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        groups.entry(record.backend.as_str()).or_default().push(index);
    }

    for members in groups.values() {
        let group: Vec<&ServerRecord> = members.iter().map(|&i| &records[i]).collect();
        for (&index, weight) in members.iter().zip(weigh_group(&group)) {
            weights[index] = weight;
        }
    }

    records
        .into_iter()
        .zip(weights)
        .map(|(record, weight)| ServerState::new(record, weight))
        .collect()
}

fn raw_score(record: &ServerRecord) -> f64 {
    if record.is_excluded() {
        0.0
    } else {
        1.0 / (record.error_signal() as f64 + 1.0)
    }
}

fn weigh_group(group: &[&ServerRecord]) -> Vec<u8> {
    let error_total: u64 = group.iter().map(|r| r.error_signal()).fold(0, u64::saturating_add);
    let scores: Vec<f64> = group.iter().map(|r| raw_score(r)).collect();
    let score_total: f64 = scores.iter().sum();

    group
        .iter()
        .zip(&scores)
        .map(|(record, &score)| {
            if record.is_excluded() {
                0
            } else if error_total <= HEALTHY_GROUP_ERROR_LIMIT {
                FULL_WEIGHT
            } else if score_total <= 0.0 {
                0
            } else {
                share(score, score_total)
            }
        })
        .collect()
}

fn share(score: f64, total: f64) -> u8 {
    (score / total * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::state::ServerStatus;

    fn up(backend: &str, server: &str) -> ServerRecord {
        ServerRecord::new(backend, server, ServerStatus::Up)
    }

    fn weights_by_name(states: &[ServerState]) -> HashMap<String, u8> {
        states.iter().map(|s| (s.record.server.clone(), s.weight)).collect()
    }

    #[test]
    fn web_group_splits_eighty_twenty() {
        let states = compute_weights(vec![
            up("web", "A"),
            up("web", "B").with_retries(2).with_response_errors(1),
        ]);
        let weights = weights_by_name(&states);
        assert_eq!(weights["A"], 80);
        assert_eq!(weights["B"], 20);
    }

    #[test]
    fn healthy_group_gets_full_weight() {
        let states = compute_weights(vec![
            up("web", "a"),
            up("web", "b").with_retries(1),
            up("web", "c"),
        ]);
        assert!(states.iter().all(|s| s.weight == FULL_WEIGHT));
    }

    #[test]
    fn down_server_is_zero_regardless_of_counters() {
        let lone = compute_weights(vec![ServerRecord::new("api", "api1", ServerStatus::Down)]);
        assert_eq!(lone[0].weight, 0);

        let noisy = compute_weights(vec![
            ServerRecord::new("api", "api1", ServerStatus::Down).with_retries(9),
            up("api", "api2"),
        ]);
        let weights = weights_by_name(&noisy);
        assert_eq!(weights["api1"], 0);
        assert_eq!(weights["api2"], 100);
    }

    #[test]
    fn too_many_response_errors_excludes() {
        let states = compute_weights(vec![
            up("web", "bad").with_response_errors(4),
            up("web", "good").with_retries(1),
        ]);
        let weights = weights_by_name(&states);
        assert_eq!(weights["bad"], 0);
        assert_eq!(weights["good"], 100);
    }

    #[test]
    fn all_excluded_group_is_all_zero() {
        let states = compute_weights(vec![
            up("web", "a").with_response_errors(5),
            ServerRecord::new("web", "b", ServerStatus::Down).with_retries(3),
        ]);
        assert!(states.iter().all(|s| s.weight == 0));
    }

    #[test]
    fn groups_are_scored_independently() {
        let states = compute_weights(vec![
            up("web", "A"),
            up("api", "x").with_redispatches(5),
            up("web", "B").with_retries(2).with_response_errors(1),
            up("api", "y").with_redispatches(5),
        ]);
        let names: Vec<_> = states.iter().map(|s| s.record.server.as_str()).collect();
        assert_eq!(names, vec!["A", "x", "B", "y"]);

        let weights = weights_by_name(&states);
        assert_eq!(weights["A"], 80);
        assert_eq!(weights["B"], 20);
        assert_eq!(weights["x"], 50);
        assert_eq!(weights["y"], 50);
    }

    #[test]
    fn rounding_is_independent_per_server() {
        // Three equal shares of 33.33..% each round down; the group sums to 99.
        let states = compute_weights(vec![
            up("web", "a").with_retries(1),
            up("web", "b").with_retries(1),
            up("web", "c").with_retries(1),
        ]);
        assert!(states.iter().all(|s| s.weight == 33));
    }

    #[test]
    fn ties_round_away_from_zero() {
        // Scores 1/2, 1/4, 1/8, 1/8 sum to exactly 1, so the last two sit on 12.5.
        let states = compute_weights(vec![
            up("web", "a").with_retries(1),
            up("web", "b").with_retries(3),
            up("web", "c").with_retries(7),
            up("web", "d").with_retries(7),
        ]);
        let weights = weights_by_name(&states);
        assert_eq!(weights["a"], 50);
        assert_eq!(weights["b"], 25);
        assert_eq!(weights["c"], 13);
        assert_eq!(weights["d"], 13);
    }

    #[test]
    fn weights_stay_in_range() {
        let mut records = Vec::new();
        for i in 0..20u64 {
            let status = if i % 5 == 0 { ServerStatus::Down } else { ServerStatus::Up };
            records.push(
                ServerRecord::new(format!("g{}", i % 3), format!("s{i}"), status)
                    .with_retries(i)
                    .with_response_errors(i % 6)
                    .with_redispatches(u64::MAX / 4),
            );
        }
        for state in compute_weights(records) {
            assert!(state.weight <= 100);
            if state.record.is_excluded() {
                assert_eq!(state.weight, 0);
            }
        }
    }

    #[test]
    fn recomputation_is_idempotent() {
        let records = vec![
            up("web", "A"),
            up("web", "B").with_retries(2).with_response_errors(1),
            ServerRecord::new("api", "api1", ServerStatus::Down),
        ];
        let first = compute_weights(records.clone());
        let second = compute_weights(records);
        assert_eq!(first, second);
    }
}
