//! End-to-end run for one city: validate folders, aggregate, render, write.

use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::analyzers::analyzer::{aggregate_sources, discover_csv_files};
use crate::analyzers::series::{build_series_in_range, grand_total};
use crate::analyzers::types::YearSeries;
use crate::chart::render_chart;
use crate::config::Config;
use crate::output::{chart_path, print_pretty, save_png, write_monthly_csv};

/// Missing folders. These end the run with a non-zero exit status.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("data folder not found ({})", .0.display())]
    DataRootMissing(PathBuf),
    #[error("city data folder not found ({})", .0.display())]
    CityFolderMissing(PathBuf),
}

/// How a successful run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// A chart was written to `chart`.
    Rendered { chart: PathBuf, series: Vec<YearSeries> },
    /// The city folder holds no CSV file; nothing was written.
    NoInput { folder: PathBuf },
    /// CSV files were found but none held a valid reading.
    NoReadings { folder: PathBuf, files: usize },
}

/// Processes every CSV file of `city` and writes one chart into the data root.
///
/// # Errors
///
/// Returns [`SetupError`] when the data root or the city folder is missing,
/// and any error raised while reading a source, rendering, or writing.
#[tracing::instrument(skip(config), fields(data_root = %config.data_root.display()))]
pub fn run(config: &Config, city: &str) -> Result<RunOutcome> {
    if !config.data_root.is_dir() {
        return Err(SetupError::DataRootMissing(config.data_root.clone()).into());
    }

    let folder = config.city_dir(city);
    if !folder.is_dir() {
        return Err(SetupError::CityFolderMissing(folder).into());
    }

    let sources = discover_csv_files(&folder)?;
    if sources.is_empty() {
        return Ok(RunOutcome::NoInput { folder });
    }
    info!(files = sources.len(), "CSV sources discovered");
    for (category, bp) in config.categories.iter() {
        debug!(%category, lo = bp.lo, hi = bp.hi, "Breakpoint");
    }

    let agg = aggregate_sources(&sources, &config.categories, config.layout)?;
    info!(
        buckets = agg.len(),
        readings = agg.total_readings(),
        "Aggregation complete"
    );

    if let Some(export) = &config.export_csv {
        write_monthly_csv(export, &agg)?;
        info!(path = %export.display(), "Monthly counts exported");
    }

    let series = build_series_in_range(&agg, config.years);
    if series.is_empty() {
        return Ok(RunOutcome::NoReadings {
            folder,
            files: sources.len(),
        });
    }
    info!(
        years = series.len(),
        charted = grand_total(&series).total(),
        "Series built"
    );
    print_pretty(&series);

    let chart = render_chart(&series, city, &config.chart)?;
    let path = chart_path(&config.data_root, city, &Local::now());
    save_png(&chart, &path)?;

    Ok(RunOutcome::Rendered {
        chart: path,
        series,
    })
}
