//! Chart rendering for the report page.
//!
//! Two independent pure functions over run data: a bar chart of the daily
//! open-PR count window and a pie chart of the size-label distribution.
//! Both tolerate empty input (an empty chart, not an error) and render
//! deterministically for a given input, so consecutive runs over identical
//! data produce identical artifacts.
//!
//! Artifacts are PNG images held in memory and base64-encoded for embedding
//! as `data:` URIs; nothing is ever written to disk.

use crate::error::{PulseError, Result};
use crate::history::SeriesRow;
use crate::tracker::SnapshotItem;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::BTreeMap;

const COUNT_CHART_SIZE: (u32, u32) = (900, 450);
const DISTRIBUTION_CHART_SIZE: (u32, u32) = (640, 480);

const SLICE_COLORS: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// An encoded chart image. Produced fresh each run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    png: Vec<u8>,
}

impl ChartArtifact {
    /// Raw PNG bytes.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Base64 encoding of the PNG, for `data:image/png;base64,...` embedding.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.png)
    }
}

/// Render the daily count window as a bar chart: one bar per date in
/// chronological order, each annotated with its numeric count.
///
/// An empty window yields a valid chart with zero bars.
pub fn render_count_chart(window: &[SeriesRow]) -> Result<ChartArtifact> {
    let (width, height) = COUNT_CHART_SIZE;
    let mut buf = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let chart_area = root
            .titled("Open pull requests per day", ("sans-serif", 22))
            .map_err(render_err)?;

        if !window.is_empty() {
            let max_count = window.iter().map(|r| r.count).max().unwrap_or(0);
            let y_top = max_count + (max_count / 5).max(1);

            let mut chart = ChartBuilder::on(&chart_area)
                .margin(12)
                .x_label_area_size(36)
                .y_label_area_size(44)
                .build_cartesian_2d(0..window.len(), 0u64..y_top)
                .map_err(render_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(window.len().min(12))
                .x_label_formatter(&|idx| {
                    window
                        .get(*idx)
                        .map(|r| r.display_date())
                        .unwrap_or_default()
                })
                .y_desc("open pull requests")
                .draw()
                .map_err(render_err)?;

            chart
                .draw_series(window.iter().enumerate().map(|(i, row)| {
                    Rectangle::new([(i, 0), (i + 1, row.count)], BLUE.mix(0.6).filled())
                }))
                .map_err(render_err)?;

            let annotation = TextStyle::from(("sans-serif", 15).into_font())
                .pos(Pos::new(HPos::Left, VPos::Bottom));
            chart
                .draw_series(window.iter().enumerate().map(|(i, row)| {
                    Text::new(row.count.to_string(), (i, row.count), annotation.clone())
                }))
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }
    encode_png(&buf, width, height)
}

/// Group items by the size labels they carry, keyed by the label with the
/// prefix stripped.
///
/// Items without a matching label contribute nothing; items with several
/// matching labels are counted once per label, so group totals may exceed
/// the item count.
pub fn size_label_distribution(items: &[SnapshotItem], prefix: &str) -> BTreeMap<String, usize> {
    let mut groups = BTreeMap::new();
    for item in items {
        for size in item.size_labels(prefix) {
            *groups.entry(size.to_string()).or_insert(0) += 1;
        }
    }
    groups
}

/// Render the size-label distribution as a pie chart: one slice per distinct
/// size label, percentage annotated.
///
/// An empty item sequence (or one with no size labels) yields a valid empty
/// chart.
pub fn render_distribution_chart(items: &[SnapshotItem], prefix: &str) -> Result<ChartArtifact> {
    let groups = size_label_distribution(items, prefix);

    let (width, height) = DISTRIBUTION_CHART_SIZE;
    let mut buf = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let chart_area = root
            .titled("Pull request size distribution", ("sans-serif", 22))
            .map_err(render_err)?;

        if !groups.is_empty() {
            let labels: Vec<String> = groups.keys().cloned().collect();
            let sizes: Vec<f64> = groups.values().map(|count| *count as f64).collect();
            let colors: Vec<RGBColor> = (0..labels.len())
                .map(|i| SLICE_COLORS[i % SLICE_COLORS.len()])
                .collect();

            let center = ((width / 2) as i32, (height / 2) as i32);
            let radius = f64::from(width.min(height)) * 0.32;
            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.label_style(("sans-serif", 18).into_font());
            pie.percentages(("sans-serif", 14).into_font());
            chart_area.draw(&pie).map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }
    encode_png(&buf, width, height)
}

fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<ChartArtifact> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(render_err)?;
    Ok(ChartArtifact { png })
}

fn render_err<E: std::fmt::Display>(err: E) -> PulseError {
    PulseError::Render(err.to_string())
}
