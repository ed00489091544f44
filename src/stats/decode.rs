//! Decoding of HAProxy's CSV stats export.
//!
//! HAProxy emits one header line (`# pxname,svname,qcur,...`) followed by one
//! line per proxy/server. Fields are never quoted, so rows are split on commas.
//! Columns are looked up by header name; extra or reordered columns are fine.

use std::time::Duration;

use crate::health::state::ServerStatus;
use crate::stats::record::{ServerRecord, DEFAULT_LB_WEIGHT};
use crate::stats::source::StatsError;

/// `svname` values of aggregate rows.
const AGGREGATE_ROWS: [&str; 2] = ["BACKEND", "FRONTEND"];

/// Column positions resolved from the header line.
#[derive(Debug)]
struct Columns {
    backend: usize,
    server: usize,
    status: Option<usize>,
    weight: Option<usize>,
    check_failures: Option<usize>,
    redispatches: Option<usize>,
    retries: Option<usize>,
    response_errors: Option<usize>,
    last_change: Option<usize>,
}

impl Columns {
    fn from_header(header: &str) -> Result<Self, StatsError> {
        let names: Vec<&str> = header
            .split(',')
            .map(|name| name.trim().trim_start_matches('#').trim())
            .collect();
        let find = |wanted: &str| names.iter().position(|name| *name == wanted);

        let backend = find("pxname").ok_or_else(|| StatsError::Decode("header has no 'pxname' column".into()))?;
        let server = find("svname").ok_or_else(|| StatsError::Decode("header has no 'svname' column".into()))?;

        Ok(Self {
            backend,
            server,
            status: find("status"),
            weight: find("weight"),
            check_failures: find("chkfail"),
            redispatches: find("wredis"),
            retries: find("wretr"),
            response_errors: find("eresp"),
            last_change: find("lastchg"),
        })
    }
}

fn field<'a>(row: &[&'a str], index: Option<usize>) -> &'a str {
    index.and_then(|i| row.get(i)).map(|value| value.trim()).unwrap_or("")
}

fn counter(row: &[&str], index: Option<usize>) -> u64 {
    field(row, index).parse().unwrap_or(0)
}

/// Decode a stats payload into per-server records, skipping aggregate rows.
pub fn decode_csv(body: &str) -> Result<Vec<ServerRecord>, StatsError> {
    let mut lines = body.lines().filter(|line| !line.trim().is_empty());
    let header = lines.next().ok_or(StatsError::NoData)?;
    let columns = Columns::from_header(header)?;

    let mut data_rows = 0usize;
    let mut records = Vec::new();
    for line in lines {
        let row: Vec<&str> = line.split(',').collect();
        if row.len() < 2 {
            continue;
        }
        data_rows += 1;

        let server = field(&row, Some(columns.server));
        if AGGREGATE_ROWS.contains(&server) {
            continue;
        }

        records.push(ServerRecord {
            backend: field(&row, Some(columns.backend)).to_string(),
            server: server.to_string(),
            status: ServerStatus::parse(field(&row, columns.status)),
            lb_weight: field(&row, columns.weight).parse().unwrap_or(DEFAULT_LB_WEIGHT),
            check_failures: counter(&row, columns.check_failures),
            redispatches: counter(&row, columns.redispatches),
            retries: counter(&row, columns.retries),
            response_errors: counter(&row, columns.response_errors),
            last_change: field(&row, columns.last_change).parse().ok().map(Duration::from_secs),
        });
    }

    if data_rows == 0 {
        return Err(StatsError::NoData);
    }

    Ok(records)
}
