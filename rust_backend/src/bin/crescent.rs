use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;

use crescent_vis::app;
use crescent_vis::config::{ConfigOverrides, RunConfig};
use crescent_vis::CrescentError;

#[derive(Parser)]
#[command(
    name = "crescent",
    about = "Crescent moon visibility across published criteria"
)]
struct Cli {
    /// Path to a crescent.toml run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Events to evaluate (sunset, moonset)
    #[arg(long, num_args = 1..)]
    events: Option<Vec<String>>,

    /// Evaluate every minute between sunset and moonset
    #[arg(long)]
    full_range: bool,

    /// Visibility models to apply (ilyas, yallop, odeh, shaukat, saao)
    #[arg(long, num_args = 1..)]
    models: Option<Vec<String>>,

    /// Generate plots after processing
    #[arg(long)]
    plot: bool,

    /// Delete these file types (png, csv, txt) in the data directory before running
    #[arg(long, num_args = 0..)]
    clean: Option<Vec<String>>,

    /// Observer latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Observer longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Observer elevation in metres
    #[arg(long, allow_negative_numbers = true)]
    elevation: Option<f64>,

    /// First UTC date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last UTC date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Output directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// CSV file name inside the output directory
    #[arg(long)]
    output: Option<String>,

    /// Also write rows as JSON to this file name inside the output directory
    #[arg(long)]
    json: Option<String>,

    /// Models drawn together on one overlay chart
    #[arg(long, num_args = 1..)]
    overlay: Option<Vec<String>>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            events: self.events.clone(),
            full_range: self.full_range.then_some(true),
            models: self.models.clone(),
            plot: self.plot.then_some(true),
            clean: self.clean.clone(),
            latitude_deg: self.lat,
            longitude_deg: self.lon,
            elevation_m: self.elevation,
            start: self.start,
            end: self.end,
            data_dir: self.data_dir.clone(),
            csv_file: self.output.clone(),
            json_file: self.json.clone(),
            overlay_models: self.overlay.clone(),
        }
    }
}

fn main() -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    let cli = Cli::parse();

    let mut config = RunConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.overrides());

    let summary = app::run(&config).inspect_err(|err| {
        let invalid = err
            .downcast_ref::<CrescentError>()
            .is_some_and(CrescentError::is_configuration);
        if invalid {
            log::error!("Run configuration rejected, nothing was computed");
        }
    })?;
    log::info!(
        "Evaluated {} instants over {} dates, wrote {} files",
        summary.table.len(),
        summary.table.dates().len(),
        summary.outputs.len()
    );
    Ok(())
}
