//! Run configuration.
//!
//! All settings live in one immutable [`Config`] loaded once at startup and
//! passed into each component. Secrets can be supplied via environment
//! variables (`PR_PULSE_TRACKER_TOKEN`, `PR_PULSE_WIKI_TOKEN`) instead of the
//! YAML file, which takes care of CI environments where the file is checked
//! in without credentials.

use crate::error::{PulseError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `tracker.token`.
pub const TRACKER_TOKEN_ENV: &str = "PR_PULSE_TRACKER_TOKEN";
/// Environment variable overriding `wiki.token`.
pub const WIKI_TOKEN_ENV: &str = "PR_PULSE_WIKI_TOKEN";

/// Top-level configuration, deserialized from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Issue tracker search settings.
    pub tracker: TrackerConfig,
    /// Document store settings.
    pub wiki: WikiConfig,
    /// Report and time-series settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Issue tracker search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Search URL template. The literal `{query}` placeholder is substituted
    /// with [`TrackerConfig::query`] before the request is sent.
    pub url: String,
    /// Search query selecting the open pull requests to report on.
    pub query: String,
    /// API token sent as `Authorization: token <token>`.
    #[serde(default)]
    pub token: String,
    /// `Accept` header for the search request.
    #[serde(default = "default_accept")]
    pub accept: String,
}

/// Document store (Confluence) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Base URL of the Confluence instance, without a trailing slash.
    pub base_url: String,
    /// Space key the report page lives in.
    pub space_key: String,
    /// Optional parent page. When set, create and update both attach the
    /// page under this ancestor.
    #[serde(default)]
    pub parent_page_id: Option<String>,
    /// Basic-auth user.
    pub user: String,
    /// Basic-auth token.
    #[serde(default)]
    pub token: String,
}

/// Report and time-series configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Exact title of the report page. Lookup, create, and update all key on
    /// this title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Backing CSV file for the daily count series.
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
    /// How many trailing days of the series the count chart shows.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Prefix identifying size-classification labels, e.g. `pr_size_S`.
    #[serde(default = "default_size_label_prefix")]
    pub size_label_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            title: default_title(),
            history_file: default_history_file(),
            window_days: default_window_days(),
            size_label_prefix: default_size_label_prefix(),
        }
    }
}

fn default_accept() -> String {
    "application/vnd.github+json".to_string()
}

fn default_title() -> String {
    "Open Pull Requests".to_string()
}

fn default_history_file() -> PathBuf {
    PathBuf::from("data/pr-history.csv")
}

fn default_window_days() -> u32 {
    30
}

fn default_size_label_prefix() -> String {
    "pr_size_".to_string()
}

impl Config {
    /// Load configuration from a YAML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Replace file-sourced secrets with environment values when present.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(TRACKER_TOKEN_ENV) {
            self.tracker.token = token;
        }
        if let Ok(token) = std::env::var(WIKI_TOKEN_ENV) {
            self.wiki.token = token;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.tracker.url.is_empty() {
            return Err(PulseError::Config("tracker.url must not be empty".to_string()));
        }
        if self.wiki.base_url.is_empty() {
            return Err(PulseError::Config("wiki.base_url must not be empty".to_string()));
        }
        if self.wiki.space_key.is_empty() {
            return Err(PulseError::Config(
                "wiki.space_key must not be empty".to_string(),
            ));
        }
        if self.report.title.is_empty() {
            return Err(PulseError::Config("report.title must not be empty".to_string()));
        }
        Ok(())
    }
}

impl TrackerConfig {
    /// The search URL with the `{query}` placeholder substituted.
    pub fn search_url(&self) -> String {
        self.url.replace("{query}", &self.query)
    }
}
