//! pr-pulse core library
//!
//! Report synchronization pipeline: snapshot open pull requests, maintain a
//! daily count series, render charts, and publish an HTML report page to a
//! Confluence space, updating the page in place on every run.

pub mod charts;
pub mod config;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod publisher;
pub mod report;
pub mod telemetry;
pub mod tracker;

pub use charts::{
    render_count_chart, render_distribution_chart, size_label_distribution, ChartArtifact,
};
pub use config::{Config, ReportConfig, TrackerConfig, WikiConfig};
pub use error::{PulseError, Result};
pub use history::{HistoryStore, SeriesRow};
pub use pipeline::{run_pipeline, RunReport};
pub use publisher::{PageIdentity, PublishOutcome, WikiClient};
pub use report::render_report;
pub use telemetry::init_tracing;
pub use tracker::{SnapshotItem, TrackerClient};

/// pr-pulse version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
