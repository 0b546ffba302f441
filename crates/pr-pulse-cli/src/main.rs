//! pr-pulse: open pull request report pipeline.
//!
//! One invocation is one run: snapshot the open pull requests matching the
//! configured query, record today's count in the daily series, render the
//! charts, and publish the report page. An external scheduler (cron, CI) is
//! expected to invoke one run at a time.

use anyhow::{Context, Result};
use clap::Parser;
use pr_pulse_core::{init_tracing, run_pipeline, Config, PublishOutcome};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "pr-pulse")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Snapshot open pull requests and publish a wiki report", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "PR_PULSE_CONFIG", default_value = "config/config.yaml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Run every stage but skip the document store write
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = Config::load(&cli.config)
        .with_context(|| format!("load configuration from {}", cli.config.display()))?;

    let report = run_pipeline(&config, cli.dry_run)
        .await
        .context("report run failed")?;

    match report.outcome {
        Some(PublishOutcome::Created) => println!(
            "Page '{}' created ({} open pull requests on {}).",
            report.page_title, report.today_count, report.today
        ),
        Some(PublishOutcome::Updated { version }) => println!(
            "Page '{}' updated to version {} ({} open pull requests on {}).",
            report.page_title, version, report.today_count, report.today
        ),
        None => println!(
            "Dry run: page '{}' not written ({} open pull requests on {}).",
            report.page_title, report.today_count, report.today
        ),
    }

    Ok(())
}
