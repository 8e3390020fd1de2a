//! Result aggregation and composite scoring.
//!
//! [`ResultTable`] accumulates rows in date order then instant order and
//! exposes them in two shapes: flat string records for tabular export, and
//! per-field time series grouped by date for plotting.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::{EventKind, ObservableVector, ResultRow};
use crate::models::{encode_label, ModelSelection, VisibilityModel};
use crate::time::{format_naive, format_utc};

/// Columns shared by every run, before the per-model score/label pairs.
pub const COMMON_COLUMNS: [&str; 18] = [
    "datetime",
    "event_type",
    "sunrise",
    "sunset",
    "moonrise",
    "moonset",
    "moon_altitude",
    "sun_altitude",
    "separation",
    "illumination_fraction",
    "crescent_width",
    "moon_age",
    "moon_phase_angle",
    "moon_distance",
    "sun_distance",
    "moon_apparent_mag",
    "sun_apparent_mag",
    "visibility_score",
];

/// Heuristic composite: `illumination * 100 + width * 50 + altitude * 2`.
///
/// The weights are fixed and not physically derived.
pub fn composite_score(
    illumination_fraction: f64,
    crescent_width_deg: f64,
    moon_altitude_deg: f64,
) -> f64 {
    illumination_fraction * 100.0 + crescent_width_deg * 50.0 + moon_altitude_deg * 2.0
}

/// Observables under their output column names, in column order.
pub fn observable_columns(obs: &ObservableVector) -> [(&'static str, f64); 11] {
    [
        ("moon_altitude", obs.moon_altitude_deg),
        ("sun_altitude", obs.sun_altitude_deg),
        ("separation", obs.moon_sun_separation_deg),
        ("illumination_fraction", obs.moon_illumination_fraction),
        ("crescent_width", obs.moon_crescent_width_deg),
        ("moon_age", obs.moon_age_days),
        ("moon_phase_angle", obs.moon_phase_angle_deg),
        ("moon_distance", obs.moon_distance_km),
        ("sun_distance", obs.sun_distance_km),
        ("moon_apparent_mag", obs.moon_apparent_magnitude),
        ("sun_apparent_mag", obs.sun_apparent_magnitude),
    ]
}

/// Samples of one numeric field, grouped by swept date.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSeries {
    pub field: String,
    pub by_date: BTreeMap<NaiveDate, Vec<(DateTime<Utc>, f64)>>,
}

/// All rows of a run plus the model set that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    models: Vec<VisibilityModel>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(models: &ModelSelection) -> Self {
        Self {
            models: models.models().to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = ResultRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn models(&self) -> &[VisibilityModel] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct swept dates that produced at least one row, in row order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = Vec::new();
        for row in &self.rows {
            let date = row.date();
            if !dates.contains(&date) {
                dates.push(date);
            }
        }
        dates
    }

    /// Column names: the common columns then `{model}_score`, `{model}_label`
    /// for each selected model.
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = COMMON_COLUMNS.iter().map(|c| c.to_string()).collect();
        for model in &self.models {
            header.push(model.score_column());
            header.push(model.label_column());
        }
        header
    }

    /// One row as strings aligned with [`ResultTable::header`]. Absent
    /// events and verdicts become empty cells.
    pub fn record(&self, row: &ResultRow) -> Vec<String> {
        let mut record = Vec::with_capacity(COMMON_COLUMNS.len() + 2 * self.models.len());
        record.push(format_naive(&row.instant.timestamp));
        record.push(row.instant.kind.label().to_string());
        for kind in EventKind::ALL {
            record.push(row.events.get(kind).map(|at| format_utc(&at)).unwrap_or_default());
        }
        for (_, value) in observable_columns(&row.observables) {
            record.push(value.to_string());
        }
        record.push(row.composite_score.to_string());
        for model in &self.models {
            match row.verdicts.get(*model) {
                Some(verdict) => {
                    record.push(verdict.score.to_string());
                    record.push(verdict.label.to_string());
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        record
    }

    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| self.record(row))
    }

    /// Numeric cells of a row: observables, composite score and model scores.
    fn numeric_values(&self, row: &ResultRow) -> Vec<(String, f64)> {
        let mut values: Vec<(String, f64)> = observable_columns(&row.observables)
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        values.push(("visibility_score".to_string(), row.composite_score));
        for model in &self.models {
            if let Some(verdict) = row.verdicts.get(*model) {
                values.push((model.score_column(), f64::from(verdict.score)));
            }
        }
        values
    }

    /// Field → date → ordered `(timestamp, value)` samples, in column order.
    ///
    /// Event timestamps and labels are not numeric and never appear here.
    pub fn time_series(&self) -> Vec<FieldSeries> {
        let mut series: Vec<FieldSeries> = Vec::new();
        for row in &self.rows {
            let date = row.date();
            for (field, value) in self.numeric_values(row) {
                let entry = match series.iter().position(|s| s.field == field) {
                    Some(index) => &mut series[index],
                    None => {
                        series.push(FieldSeries {
                            field,
                            by_date: BTreeMap::new(),
                        });
                        let last = series.len() - 1;
                        &mut series[last]
                    }
                };
                entry
                    .by_date
                    .entry(date)
                    .or_default()
                    .push((row.instant.timestamp, value));
            }
        }
        series
    }

    /// Encoded visibility of one model, grouped by date. Labels outside the
    /// encoding table are skipped.
    pub fn encoded_visibility(
        &self,
        model: VisibilityModel,
    ) -> BTreeMap<NaiveDate, Vec<(DateTime<Utc>, u8)>> {
        let mut by_date: BTreeMap<NaiveDate, Vec<(DateTime<Utc>, u8)>> = BTreeMap::new();
        for row in &self.rows {
            let Some(verdict) = row.verdicts.get(model) else {
                continue;
            };
            match encode_label(verdict.label) {
                Some(ordinal) => by_date
                    .entry(row.date())
                    .or_default()
                    .push((row.instant.timestamp, ordinal)),
                None => log::warn!("No ordinal for {} label '{}'", model, verdict.label),
            }
        }
        by_date
    }

    /// Distinct labels each selected model produced, in first-seen order.
    pub fn model_labels(&self) -> Vec<(VisibilityModel, Vec<&'static str>)> {
        self.models
            .iter()
            .map(|model| {
                let mut labels: Vec<&'static str> = Vec::new();
                for row in &self.rows {
                    if let Some(verdict) = row.verdicts.get(*model) {
                        if !labels.contains(&verdict.label) {
                            labels.push(verdict.label);
                        }
                    }
                }
                (*model, labels)
            })
            .collect()
    }
}
