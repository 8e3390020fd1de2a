//! PNG rendering of sweep results.
//!
//! Produces, inside the data directory:
//! - `<field>.png` for every numeric column, one line per date
//! - `visibility_<model>.png` with the model's encoded verdicts
//! - `visibility_overlay.png` when overlay models are configured
//! - `model_legend.txt` listing the labels each model produced
//!
//! The x axis is hours (UTC) since midnight of the first swept date.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::encoding::MAX_ORDINAL;
use crate::models::VisibilityModel;
use crate::services::{FieldSeries, ResultTable};
use crate::time::day_start;

pub const LEGEND_FILE_NAME: &str = "model_legend.txt";
pub const OVERLAY_FILE_NAME: &str = "visibility_overlay.png";

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Plot configuration
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Plot width in pixels
    pub width: u32,
    /// Plot height in pixels
    pub height: u32,
    /// Models drawn together on the overlay chart. When set, only these get
    /// their own visibility chart too.
    pub overlay_models: Vec<VisibilityModel>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            overlay_models: Vec::new(),
        }
    }
}

/// Renders every chart for a result table.
pub struct PlotRenderer {
    config: PlotConfig,
}

impl Default for PlotRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotRenderer {
    pub fn new() -> Self {
        Self::with_config(PlotConfig::default())
    }

    pub fn with_config(config: PlotConfig) -> Self {
        Self { config }
    }

    /// Draw all charts into `dir` and return the paths written.
    pub fn render_all(&self, table: &ResultTable, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let mut written = Vec::new();
        let Some(origin) = table.dates().first().copied().map(day_start) else {
            log::warn!("No rows to plot");
            written.push(write_legend(table, dir)?);
            return Ok(written);
        };

        for series in table.time_series() {
            let path = dir.join(format!("{}.png", series.field));
            self.draw_field(&series, origin, &path)
                .map_err(|e| anyhow!("Failed to render {}: {}", path.display(), e))?;
            log::info!("Saved plot: {}", path.display());
            written.push(path);
        }

        for model in self.individual_models(table) {
            let path = dir.join(format!("visibility_{}.png", model));
            let encoded = table.encoded_visibility(model);
            self.draw_visibility(
                &format!("{} Visibility Over Time", title_case(model.name())),
                &[(model, encoded)],
                origin,
                &path,
            )
            .map_err(|e| anyhow!("Failed to render {}: {}", path.display(), e))?;
            log::info!("Saved plot: {}", path.display());
            written.push(path);
        }

        if !self.config.overlay_models.is_empty() {
            let layers: Vec<_> = self
                .config
                .overlay_models
                .iter()
                .filter(|model| table.models().contains(model))
                .map(|model| (*model, table.encoded_visibility(*model)))
                .collect();
            let path = dir.join(OVERLAY_FILE_NAME);
            self.draw_visibility("Overlaid Model Visibility", &layers, origin, &path)
                .map_err(|e| anyhow!("Failed to render {}: {}", path.display(), e))?;
            log::info!("Saved plot: {}", path.display());
            written.push(path);
        }

        written.push(write_legend(table, dir)?);
        Ok(written)
    }

    /// Models that get their own visibility chart.
    fn individual_models(&self, table: &ResultTable) -> Vec<VisibilityModel> {
        table
            .models()
            .iter()
            .copied()
            .filter(|model| {
                self.config.overlay_models.is_empty() || self.config.overlay_models.contains(model)
            })
            .collect()
    }

    fn draw_field(&self, series: &FieldSeries, origin: DateTime<Utc>, path: &Path) -> DrawResult {
        let lines: Vec<(String, Vec<(f64, f64)>)> = series
            .by_date
            .iter()
            .map(|(date, samples)| {
                let points = samples
                    .iter()
                    .map(|(at, value)| (hours_since(origin, at), *value))
                    .collect();
                (date.to_string(), points)
            })
            .collect();

        let (x_range, y_range) =
            bounds(lines.iter().flat_map(|(_, points)| points.iter().copied()));

        let root = BitMapBackend::new(path, (self.config.width, self.config.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let label = title_case(&series.field);
        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{} Over Time", label), ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc("UTC hours since first date")
            .y_desc(label.as_str())
            .x_label_formatter(&|x| format!("{x:.1}"))
            .draw()?;

        for (index, (date, points)) in lines.into_iter().enumerate() {
            let color = Palette99::pick(index).to_rgba();
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 2, color.filled())),
            )?;
            chart
                .draw_series(LineSeries::new(points, &color))?
                .label(date)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_visibility(
        &self,
        title: &str,
        layers: &[(VisibilityModel, BTreeMap<NaiveDate, Vec<(DateTime<Utc>, u8)>>)],
        origin: DateTime<Utc>,
        path: &Path,
    ) -> DrawResult {
        let all_points = layers.iter().flat_map(|(_, by_date)| {
            by_date
                .values()
                .flatten()
                .map(move |(at, ordinal)| (hours_since(origin, at), f64::from(*ordinal)))
        });
        let (x_range, _) = bounds(all_points);
        let y_range = -0.5..f64::from(MAX_ORDINAL) + 0.5;

        let root = BitMapBackend::new(path, (self.config.width, self.config.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc("UTC hours since first date")
            .y_desc("Visibility (encoded)")
            .x_label_formatter(&|x| format!("{x:.1}"))
            .y_label_formatter(&|y| format!("{y:.0}"))
            .draw()?;

        for (index, (model, by_date)) in layers.iter().enumerate() {
            let color = Palette99::pick(index).to_rgba();
            // Dates are separate segments so no line bridges the daytime gap.
            for (segment, samples) in by_date.values().enumerate() {
                let points: Vec<(f64, f64)> = samples
                    .iter()
                    .map(|(at, ordinal)| (hours_since(origin, at), f64::from(*ordinal)))
                    .collect();
                chart.draw_series(
                    points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
                )?;
                let line = chart.draw_series(LineSeries::new(points, &color))?;
                if segment == 0 {
                    line.label(model.name())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                }
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

/// Write `model_legend.txt`: one `model: label, label` line per model.
pub fn write_legend(table: &ResultTable, dir: &Path) -> Result<PathBuf> {
    let lines: Vec<String> = table
        .model_labels()
        .into_iter()
        .map(|(model, labels)| format!("{}: {}", model, labels.join(", ")))
        .collect();

    let path = dir.join(LEGEND_FILE_NAME);
    fs::write(&path, lines.join("\n"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved legend: {}", path.display());
    Ok(path)
}

/// Fractional hours from `origin` to `at`.
pub fn hours_since(origin: DateTime<Utc>, at: &DateTime<Utc>) -> f64 {
    (*at - origin).num_seconds() as f64 / 3600.0
}

/// Padded axis ranges covering every point. Degenerate spans widen to one
/// unit.
pub fn bounds(
    points: impl Iterator<Item = (f64, f64)>,
) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    (pad(x_min, x_max), pad(y_min, y_max))
}

fn pad(min: f64, max: f64) -> std::ops::Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span <= f64::EPSILON * max.abs().max(1.0) {
        return (min - 0.5)..(max + 0.5);
    }
    let margin = span * 0.05;
    (min - margin)..(max + margin)
}

/// `moon_altitude` → `Moon Altitude`.
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
