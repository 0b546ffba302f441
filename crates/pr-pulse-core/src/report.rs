//! Report composition.
//!
//! Merges the snapshot, the two chart artifacts, and the counts into one
//! HTML document in the store's storage representation. The rest of the
//! pipeline treats the rendered body as an opaque string.

use crate::charts::ChartArtifact;
use crate::error::Result;
use crate::tracker::SnapshotItem;
use askama::Template;
use chrono::{DateTime, Utc};

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    title: &'a str,
    total: usize,
    generated_at: String,
    count_chart: String,
    distribution_chart: String,
    rows: Vec<ItemRow>,
}

/// One table row, pre-formatted for the template.
struct ItemRow {
    number: u64,
    title: String,
    url: String,
    author: String,
    labels: String,
    opened: String,
}

impl From<&SnapshotItem> for ItemRow {
    fn from(item: &SnapshotItem) -> Self {
        ItemRow {
            number: item.number,
            title: item.title.clone(),
            url: item.url.clone(),
            author: item.author.clone(),
            labels: item.labels.join(", "),
            opened: item.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Render the report body for the document store.
pub fn render_report(
    title: &str,
    items: &[SnapshotItem],
    count_chart: &ChartArtifact,
    distribution_chart: &ChartArtifact,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let template = ReportTemplate {
        title,
        total: items.len(),
        generated_at: generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        count_chart: count_chart.to_base64(),
        distribution_chart: distribution_chart.to_base64(),
        rows: items.iter().map(ItemRow::from).collect(),
    };
    Ok(template.render()?)
}
