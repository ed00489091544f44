//! Stats feed collaborator.
//!
//! # Responsibilities
//! - Fetch the CSV stats export over HTTP
//! - Hand the decoded per-server records to the polling scheduler
//!
//! # Design Decisions
//! - `StatsSource` is a trait so the scheduler can be driven by fakes in tests
//! - Every request is bounded by connect and total timeouts

use std::future::Future;
use thiserror::Error;

use crate::config::HaproxyConfig;
use crate::stats::decode::decode_csv;
use crate::stats::record::ServerRecord;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to fetch stats from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("stats endpoint {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("malformed stats payload: {0}")]
    Decode(String),
    #[error("stats payload has no data rows")]
    NoData,
}

impl StatsError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StatsError::Fetch { .. } | StatsError::Status { .. } => "fetch_error",
            StatsError::Decode(_) => "decode_error",
            StatsError::NoData => "no_data",
        }
    }
}

/// Anything that can produce the current set of server records.
pub trait StatsSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Vec<ServerRecord>, StatsError>> + Send;
}

/// Reads HAProxy's `/stats;csv` page.
#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    client: reqwest::Client,
    url: String,
}

impl HttpStatsSource {
    pub fn new(config: &HaproxyConfig) -> Result<Self, reqwest::Error> {
        Self::with_url(config.stats_url(), config)
    }

    /// Build a source for an explicit URL, taking timeouts from `config`.
    pub fn with_url(url: impl Into<String>, config: &HaproxyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(concat!("weight-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn fetch_body(&self) -> Result<String, StatsError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| StatsError::Fetch {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatsError::Status {
                url: self.url.clone(),
                status,
            });
        }

        response.text().await.map_err(|source| StatsError::Fetch {
            url: self.url.clone(),
            source,
        })
    }
}

impl StatsSource for HttpStatsSource {
    async fn fetch(&self) -> Result<Vec<ServerRecord>, StatsError> {
        let body = self.fetch_body().await?;
        let records = decode_csv(&body)?;
        tracing::debug!(url = %self.url, servers = records.len(), "Stats fetched");
        Ok(records)
    }
}
