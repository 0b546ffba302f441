//! Run orchestration.
//!
//! One run is a single sequential batch: fetch the snapshot, upsert today's
//! count into the time series, render both charts over the windowed series,
//! compose the HTML report, and publish it. Data flows strictly forward and
//! each stage blocks until its predecessor completes; the first failure
//! ends the run with nothing written to the document store.

use crate::charts::{render_count_chart, render_distribution_chart};
use crate::config::Config;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::publisher::{PublishOutcome, WikiClient};
use crate::report::render_report;
use crate::tracker::TrackerClient;
use chrono::{NaiveDate, Utc};
use std::time::Instant;
use tracing::info;

/// Summary of one completed run, for the caller's confirmation output.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Title of the page the report targets.
    pub page_title: String,
    /// Calendar day this run was recorded under.
    pub today: NaiveDate,
    /// Open pull requests observed this run.
    pub today_count: u64,
    /// Rows in the chart window.
    pub window_len: usize,
    /// Publish outcome; `None` on a dry run, where the write is skipped.
    pub outcome: Option<PublishOutcome>,
    /// Total run duration in milliseconds.
    pub duration_ms: u64,
}

/// Execute one report run.
///
/// With `dry_run` set, every stage up to and including report composition
/// runs normally (the time series is still updated, since the day's
/// observation is real), but the document store write is skipped.
pub async fn run_pipeline(config: &Config, dry_run: bool) -> Result<RunReport> {
    let start = Instant::now();
    let now = Utc::now();
    let today = now.date_naive();

    info!(date = %today, query = %config.tracker.query, "starting report run");

    let tracker = TrackerClient::new(config.tracker.clone());
    let items = tracker.fetch_open_items().await?;
    let today_count = items.len() as u64;

    let store = HistoryStore::new(&config.report.history_file);
    store.upsert(today, today_count)?;
    let window = store.windowed_read(config.report.window_days)?;

    let count_chart = render_count_chart(&window)?;
    let distribution_chart =
        render_distribution_chart(&items, &config.report.size_label_prefix)?;
    info!(window_rows = window.len(), "rendered charts");

    let body = render_report(
        &config.report.title,
        &items,
        &count_chart,
        &distribution_chart,
        now,
    )?;

    let outcome = if dry_run {
        info!(title = %config.report.title, "dry run, skipping publish");
        None
    } else {
        let wiki = WikiClient::new(config.wiki.clone());
        Some(wiki.publish(&config.report.title, &body).await?)
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(duration_ms, "report run finished");

    Ok(RunReport {
        page_title: config.report.title.clone(),
        today,
        today_count,
        window_len: window.len(),
        outcome,
        duration_ms,
    })
}
