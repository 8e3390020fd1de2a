//! Run orchestration.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::astro::{AstronomyProvider, SiderustEphemeris};
use crate::config::{RunConfig, ValidatedRun};
use crate::io::{clean_data_dir, write_csv, write_json, PlotConfig, PlotRenderer};
use crate::services::{ResultTable, SweepEngine};

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub table: ResultTable,
    /// Files removed by cleanup before the sweep.
    pub cleaned: usize,
    /// Every file written, CSV first.
    pub outputs: Vec<PathBuf>,
}

/// Validate `config` and run it against the built-in ephemeris.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let validated = config.validate().context("Invalid configuration")?;
    execute(&validated, SiderustEphemeris::new())
}

/// Run an already validated configuration against `provider`.
///
/// Configuration problems are caught before this point, so any file in the
/// data directory is only touched once the run is known to be well formed.
pub fn execute<P: AstronomyProvider>(run: &ValidatedRun, provider: P) -> Result<RunSummary> {
    let output = &run.output;

    // Step 1: Clean the data directory
    let cleaned = clean_data_dir(&output.data_dir, &output.clean)?;

    fs::create_dir_all(&output.data_dir).with_context(|| {
        format!("Failed to create data directory {}", output.data_dir.display())
    })?;

    // Step 2: Sweep every date
    log::info!(
        "Sweeping {} to {} at {} with models [{}]",
        run.sweep.start,
        run.sweep.end,
        run.sweep.location,
        run.sweep
            .models
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let mut engine = SweepEngine::new(provider);
    let table = engine.run(&run.sweep).context("Sweep failed")?;

    // Step 3: Write tables
    let mut outputs = Vec::new();
    write_csv(&table, &output.csv_path)?;
    outputs.push(output.csv_path.clone());

    if let Some(json_path) = &output.json_path {
        write_json(&table, json_path)?;
        outputs.push(json_path.clone());
    }

    // Step 4: Plots (if requested)
    if output.plot {
        let renderer = PlotRenderer::with_config(PlotConfig {
            overlay_models: output.overlay_models.clone(),
            ..Default::default()
        });
        outputs.extend(renderer.render_all(&table, &output.data_dir)?);
    }

    Ok(RunSummary {
        table,
        cleaned,
        outputs,
    })
}
