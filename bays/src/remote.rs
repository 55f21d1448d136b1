//! # Remote Sync
//!
//! Fetches the open-data parking bays feed and normalizes it through
//! [`crate::transform`]. The feed is served in two shapes: the explore-API
//! envelope `{results: [...], total_count}` and, from older snapshots, a
//! bare array of records. Anything else is a hard failure.
//!
//! An empty successful fetch is also treated as a failure so a stale cache
//! is preferred over silently wiping results.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{CanonicalBay, RawItem};
use crate::transform::{has_location, transform};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unrecognized upstream response format")]
    UnrecognizedFormat,

    #[error("no valid parking bay records in upstream response")]
    NoValidRecords,
}

/// Seam between the cache and the network, so the cache is testable with a
/// mock that never touches the wire.
pub trait Gateway: Send + Sync {
    fn sync(&self) -> impl Future<Output = Result<Vec<CanonicalBay>, UpstreamError>> + Send;
}

pub struct SyncGateway {
    client: Client,
    endpoint: String,
    page_limit: u32,
}

impl SyncGateway {
    pub fn new(endpoint: String, page_limit: u32, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent("kerbside/0.1")
            .timeout(timeout)
            .build()
            .expect("failed to build upstream HTTP client");

        Self {
            client,
            endpoint,
            page_limit,
        }
    }

    /// Shape detection plus normalization, shared by [`Gateway::sync`].
    fn process(payload: Value) -> Result<Vec<CanonicalBay>, UpstreamError> {
        let entries = match payload {
            Value::Object(mut map) => match map.remove("results") {
                Some(Value::Array(results)) => results,
                _ => return Err(UpstreamError::UnrecognizedFormat),
            },
            Value::Array(entries) => entries,
            _ => return Err(UpstreamError::UnrecognizedFormat),
        };

        let items: Vec<RawItem> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();

        let bays: Vec<CanonicalBay> = items
            .iter()
            .filter(|item| has_location(item.record()))
            .filter_map(transform)
            .collect();

        if bays.is_empty() {
            return Err(UpstreamError::NoValidRecords);
        }

        Ok(bays)
    }
}

impl Gateway for SyncGateway {
    async fn sync(&self) -> Result<Vec<CanonicalBay>, UpstreamError> {
        debug!("Fetching parking bays from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("limit", self.page_limit.to_string()),
                ("timezone", "Australia/Melbourne".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Upstream returned {status}");
            return Err(UpstreamError::Status { status, body });
        }

        let payload: Value = response.json().await?;
        let bays = Self::process(payload)?;

        info!("Synced {} parking bays from upstream", bays.len());
        Ok(bays)
    }
}
