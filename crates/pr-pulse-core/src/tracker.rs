//! Snapshot fetcher for the issue tracker search endpoint.
//!
//! One GET per run against the configured search URL. The response is the
//! GitHub-style search envelope `{"items": [...]}`; each item is mapped into
//! an owned [`SnapshotItem`] so downstream stages never touch the wire
//! format.

use crate::config::TrackerConfig;
use crate::error::{PulseError, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One open pull request at fetch time.
///
/// Immutable once fetched; owned solely by the current run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotItem {
    /// Tracker-side identifier (PR number).
    pub number: u64,
    /// Title at fetch time.
    pub title: String,
    /// Web URL for the report's link column.
    pub url: String,
    /// Author login.
    pub author: String,
    /// When the pull request was opened.
    pub created_at: DateTime<Utc>,
    /// All label names carried by the item.
    pub labels: Vec<String>,
}

impl SnapshotItem {
    /// Size-classification labels, with the prefix stripped.
    ///
    /// An item can legitimately carry more than one size label (for example
    /// after a relabel), so this returns all matches, in label order.
    pub fn size_labels<'a>(&'a self, prefix: &str) -> Vec<&'a str> {
        self.labels
            .iter()
            .filter_map(|label| label.strip_prefix(prefix))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    number: u64,
    title: String,
    html_url: String,
    user: WireUser,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<WireLabel>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct WireLabel {
    name: String,
}

impl From<WireItem> for SnapshotItem {
    fn from(item: WireItem) -> Self {
        SnapshotItem {
            number: item.number,
            title: item.title,
            url: item.html_url,
            author: item.user.login,
            created_at: item.created_at,
            labels: item.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

/// Client for the issue tracker search endpoint.
pub struct TrackerClient {
    config: TrackerConfig,
    http_client: reqwest::Client,
}

impl TrackerClient {
    /// Create a new tracker client.
    pub fn new(config: TrackerConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("pr-pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        TrackerClient {
            config,
            http_client,
        }
    }

    /// Fetch the current snapshot of open items matching the configured
    /// query, in the order the tracker returns them.
    ///
    /// A non-success response is a [`PulseError::FetchFailed`]: the run
    /// aborts and nothing is published, since no downstream stage has
    /// meaningful input.
    pub async fn fetch_open_items(&self) -> Result<Vec<SnapshotItem>> {
        let url = self.config.search_url();
        debug!(url = %url, "fetching open pull requests");

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", self.config.token))
            .header(ACCEPT, &self.config.accept)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PulseError::FetchFailed {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response.json().await?;
        let items: Vec<SnapshotItem> = body.items.into_iter().map(SnapshotItem::from).collect();
        info!(count = items.len(), "fetched open pull request snapshot");
        Ok(items)
    }
}
