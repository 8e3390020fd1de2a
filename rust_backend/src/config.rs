//! Run configuration file support.
//!
//! A run is described by a TOML file (`crescent.toml`) whose values can be
//! overridden from the command line. Everything is checked by
//! [`RunConfig::validate`] before any file is touched or any position is
//! computed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::{EventKind, ObserverLocation};
use crate::error::{CrescentError, CrescentResult};
use crate::models::{ModelSelection, VisibilityModel};
use crate::services::sweep::{SweepConfig, SweepMode};

/// Name of the configuration file searched for by [`RunConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "crescent.toml";

/// Run configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub observer: ObserverSettings,
    #[serde(default)]
    pub dates: DateSettings,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Observer site settings. Defaults to Melbourne.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverSettings {
    #[serde(default = "default_latitude")]
    pub latitude_deg: f64,
    #[serde(default = "default_longitude")]
    pub longitude_deg: f64,
    #[serde(default = "default_elevation")]
    pub elevation_m: f64,
}

/// Inclusive range of UTC calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateSettings {
    #[serde(default = "default_start")]
    pub start: NaiveDate,
    #[serde(default = "default_end")]
    pub end: NaiveDate,
}

/// What to evaluate at each date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSettings {
    #[serde(default = "default_events")]
    pub events: Vec<String>,
    #[serde(default)]
    pub full_range: bool,
    #[serde(default)]
    pub models: Vec<String>,
}

/// Output locations and rendering switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_csv_file")]
    pub csv_file: String,
    /// Empty disables the JSON export.
    #[serde(default)]
    pub json_file: String,
    #[serde(default)]
    pub plot: bool,
    #[serde(default)]
    pub overlay_models: Vec<String>,
    #[serde(default)]
    pub clean: Vec<String>,
}

fn default_latitude() -> f64 {
    ObserverLocation::melbourne().latitude_deg
}

fn default_longitude() -> f64 {
    ObserverLocation::melbourne().longitude_deg
}

fn default_elevation() -> f64 {
    ObserverLocation::melbourne().elevation_m
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 29).unwrap_or_default()
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 31).unwrap_or_default()
}

fn default_events() -> Vec<String> {
    vec!["sunset".to_string()]
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_csv_file() -> String {
    "melbourne_march2025.csv".to_string()
}

impl Default for ObserverSettings {
    fn default() -> Self {
        Self {
            latitude_deg: default_latitude(),
            longitude_deg: default_longitude(),
            elevation_m: default_elevation(),
        }
    }
}

impl Default for DateSettings {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
        }
    }
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            events: default_events(),
            full_range: false,
            models: Vec::new(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            csv_file: default_csv_file(),
            json_file: String::new(),
            plot: false,
            overlay_models: Vec::new(),
            clean: Vec::new(),
        }
    }
}

/// File types removable from the data directory before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupKind {
    Png,
    Csv,
    Txt,
}

impl CleanupKind {
    pub fn extension(&self) -> &'static str {
        match self {
            CleanupKind::Png => "png",
            CleanupKind::Csv => "csv",
            CleanupKind::Txt => "txt",
        }
    }
}

impl fmt::Display for CleanupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for CleanupKind {
    type Err = CrescentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "png" => Ok(CleanupKind::Png),
            "csv" => Ok(CleanupKind::Csv),
            "txt" => Ok(CleanupKind::Txt),
            _ => Err(CrescentError::config(format!(
                "unknown cleanup type '{}'. Use one of: png, csv, txt",
                s
            ))),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub events: Option<Vec<String>>,
    pub full_range: Option<bool>,
    pub models: Option<Vec<String>>,
    pub plot: Option<bool>,
    pub clean: Option<Vec<String>>,
    pub latitude_deg: Option<f64>,
    pub longitude_deg: Option<f64>,
    pub elevation_m: Option<f64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub data_dir: Option<PathBuf>,
    pub csv_file: Option<String>,
    pub json_file: Option<String>,
    pub overlay_models: Option<Vec<String>>,
}

/// Where and how results are written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPlan {
    pub data_dir: PathBuf,
    pub csv_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub plot: bool,
    pub overlay_models: Vec<VisibilityModel>,
    pub clean: Vec<CleanupKind>,
}

/// A configuration that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRun {
    pub sweep: SweepConfig,
    pub output: OutputPlan,
}

impl RunConfig {
    /// Load run configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(RunConfig)` if successful
    /// * `Err(CrescentError::Configuration)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> CrescentResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CrescentError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            CrescentError::Configuration(msg) => {
                CrescentError::config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> CrescentResult<Self> {
        toml::from_str(content)
            .map_err(|e| CrescentError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Load run configuration from the default location.
    ///
    /// Searches for `crescent.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    ///
    /// Falls back to the built-in defaults when none exists.
    pub fn from_default_location() -> CrescentResult<Self> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            Path::new("rust_backend").join(CONFIG_FILE_NAME),
            Path::new("..").join(CONFIG_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Using configuration {}", path.display());
                return Self::from_file(&path);
            }
        }

        log::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from `path` when given, otherwise from the default location.
    pub fn load(path: Option<&Path>) -> CrescentResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_default_location(),
        }
    }

    /// Overwrite file values with any value set on the command line.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(events) = overrides.events {
            self.evaluation.events = events;
        }
        if let Some(full_range) = overrides.full_range {
            self.evaluation.full_range = full_range;
        }
        if let Some(models) = overrides.models {
            self.evaluation.models = models;
        }
        if let Some(plot) = overrides.plot {
            self.output.plot = plot;
        }
        if let Some(clean) = overrides.clean {
            self.output.clean = clean;
        }
        if let Some(lat) = overrides.latitude_deg {
            self.observer.latitude_deg = lat;
        }
        if let Some(lon) = overrides.longitude_deg {
            self.observer.longitude_deg = lon;
        }
        if let Some(elevation) = overrides.elevation_m {
            self.observer.elevation_m = elevation;
        }
        if let Some(start) = overrides.start {
            self.dates.start = start;
        }
        if let Some(end) = overrides.end {
            self.dates.end = end;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.output.data_dir = data_dir;
        }
        if let Some(csv_file) = overrides.csv_file {
            self.output.csv_file = csv_file;
        }
        if let Some(json_file) = overrides.json_file {
            self.output.json_file = json_file;
        }
        if let Some(overlay) = overrides.overlay_models {
            self.output.overlay_models = overlay;
        }
    }

    /// Check every setting and resolve names into typed values.
    ///
    /// # Errors
    /// `CrescentError::Configuration` for unknown model, event or cleanup
    /// names, an empty model selection, an empty event list without
    /// `full_range`, a reversed date range, out-of-range coordinates or an
    /// empty CSV file name.
    pub fn validate(&self) -> CrescentResult<ValidatedRun> {
        let location = ObserverLocation::new(
            self.observer.latitude_deg,
            self.observer.longitude_deg,
            self.observer.elevation_m,
        )?;

        let models = ModelSelection::parse(&self.evaluation.models)?;

        let events = self.parse_events()?;
        let mode = if self.evaluation.full_range {
            SweepMode::Dense
        } else {
            SweepMode::Sparse(events)
        };

        let sweep = SweepConfig::new(location, self.dates.start, self.dates.end, mode, models)?;

        let overlay_models = self
            .output
            .overlay_models
            .iter()
            .map(|name| name.parse::<VisibilityModel>())
            .collect::<CrescentResult<Vec<_>>>()?;

        let clean = self
            .output
            .clean
            .iter()
            .map(|name| name.parse::<CleanupKind>())
            .collect::<CrescentResult<Vec<_>>>()?;

        if self.output.csv_file.trim().is_empty() {
            return Err(CrescentError::config("output.csv_file must not be empty"));
        }

        let data_dir = self.output.data_dir.clone();
        let csv_path = data_dir.join(&self.output.csv_file);
        let json_path = match self.output.json_file.trim() {
            "" => None,
            name => Some(data_dir.join(name)),
        };

        Ok(ValidatedRun {
            sweep,
            output: OutputPlan {
                data_dir,
                csv_path,
                json_path,
                plot: self.output.plot,
                overlay_models,
                clean,
            },
        })
    }

    /// Evaluable events in request order, duplicates removed.
    fn parse_events(&self) -> CrescentResult<Vec<EventKind>> {
        let mut events: Vec<EventKind> = Vec::new();
        for name in &self.evaluation.events {
            let kind: EventKind = name.parse()?;
            if !kind.is_evaluable() {
                return Err(CrescentError::config(format!(
                    "event '{}' cannot be evaluated. Use sunset or moonset",
                    name
                )));
            }
            if !events.contains(&kind) {
                events.push(kind);
            }
        }
        Ok(events)
    }
}
