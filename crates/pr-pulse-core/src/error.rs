//! Error taxonomy for the report pipeline.
//!
//! Every failure is terminal for the run: there is no retry loop and no
//! partial-success state. Either the full pipeline completes and exactly one
//! page reflects the latest snapshot, or nothing changes in the document
//! store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the report pipeline.
#[derive(Debug, Error)]
pub enum PulseError {
    /// Tracker search returned a non-success status. Nothing downstream has
    /// meaningful input, so the run aborts without publishing.
    #[error("tracker search failed with status {status}")]
    FetchFailed { status: u16 },

    /// Backing time-series file exists but could not be read.
    #[error("cannot read history file {}: {source}", path.display())]
    HistoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing time-series file exists but is not a valid (date, count)
    /// table. The run aborts rather than overwrite history with a fresh
    /// empty table.
    #[error("history file {} is malformed: {message}", path.display())]
    HistoryParse { path: PathBuf, message: String },

    /// Page identity lookup returned a non-success status. Distinct from
    /// "confirmed absent" (an empty result set), which takes the create path.
    #[error("page lookup failed with status {status}")]
    PublishLookup { status: u16 },

    /// The create or update write was rejected by the document store.
    #[error("publish failed with status {status}: {body}")]
    PublishWrite { status: u16, body: String },

    /// Chart rasterization failed.
    #[error("chart rendering failed: {0}")]
    Render(String),

    /// Report template rendering failed.
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    /// Configuration file is missing required values.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML parsing error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("http error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for PulseError {
    fn from(err: reqwest::Error) -> Self {
        PulseError::Http(err.to_string())
    }
}

/// Result type for report pipeline operations.
pub type Result<T> = std::result::Result<T, PulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PulseError::FetchFailed { status: 403 };
        assert!(err.to_string().contains("403"));

        let err = PulseError::PublishWrite {
            status: 409,
            body: "version conflict".to_string(),
        };
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("version conflict"));
    }

    #[test]
    fn test_history_parse_error_names_the_file() {
        let err = PulseError::HistoryParse {
            path: PathBuf::from("data/history.csv"),
            message: "invalid digit".to_string(),
        };
        assert!(err.to_string().contains("data/history.csv"));
        assert!(err.to_string().contains("malformed"));
    }
}
