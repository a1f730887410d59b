//! CLI entry point for the stateair stats tool.
//!
//! Aggregates a city's hourly PM2.5 CSV files into monthly AQI category
//! counts and writes a stacked bar chart comparing months across years.

use anyhow::{Context, Result};
use clap::Parser;
use stateair_stats::analyzers::series::YearRange;
use stateair_stats::chart::{TEXT_ELEMENTS, register_font};
use stateair_stats::config::Config;
use stateair_stats::driver::{RunOutcome, SetupError, run};
use stateair_stats::output::print_json;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "stateair_stats")]
#[command(about = "Monthly AQI category charts from StateAir PM2.5 readings", long_about = None)]
struct Cli {
    /// City to process (case-insensitive); defaults to STATEAIR_DEFAULT_CITY or "shanghai"
    #[arg(value_name = "CITY")]
    city: Option<String>,

    /// Folder holding one sub-folder of CSV files per city
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// First year to chart (inclusive)
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year to chart (inclusive)
    #[arg(long)]
    end_year: Option<i32>,

    /// Also write the monthly category counts to this CSV file
    #[arg(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    /// JSON file with alternative AQI breakpoints
    #[arg(long, value_name = "PATH")]
    breakpoints: Option<PathBuf>,

    /// TrueType font used for chart text
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Chart width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Chart height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Print per-year category totals as JSON to stdout
    #[arg(long, default_value_t = false)]
    summary: bool,
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    if let Some(root) = cli.data_root {
        config.data_root = root;
    }
    if let Some(path) = &cli.breakpoints {
        config.load_categories(path)?;
    }
    if cli.font.is_some() {
        config.font_path = cli.font;
    }
    if let Some(width) = cli.width {
        config.chart.width = width;
    }
    if let Some(height) = cli.height {
        config.chart.height = height;
    }
    config.years = YearRange::new(cli.start_year, cli.end_year)
        .context("--start-year must not be after --end-year")?;
    config.export_csv = cli.export_csv;

    match &config.font_path {
        Some(font) => match register_font(font) {
            Ok(()) => config.chart.draw_text = true,
            Err(e) => warn!(
                error = %e,
                "Chart font unusable; the chart's {TEXT_ELEMENTS} will be left out"
            ),
        },
        None => warn!(
            "No chart font found (set --font or STATEAIR_FONT_PATH); the chart's {TEXT_ELEMENTS} will be left out"
        ),
    }

    let city = cli.city.unwrap_or_else(|| config.default_city.clone());

    match run(&config, &city) {
        Ok(RunOutcome::Rendered { chart, series }) => {
            info!(city = %city, chart = %chart.display(), years = series.len(), "Done");
            if cli.summary {
                print_json(&series)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(RunOutcome::NoInput { folder }) => {
            info!(
                folder = %folder.display(),
                "No CSV file found in the data folder"
            );
            Ok(ExitCode::SUCCESS)
        }
        Ok(RunOutcome::NoReadings { folder, files }) => {
            info!(
                folder = %folder.display(),
                files,
                "No valid readings to chart"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => match e.downcast_ref::<SetupError>() {
            Some(setup) => {
                error!("{setup}");
                Ok(ExitCode::FAILURE)
            }
            None => Err(e),
        },
    }
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/stateair_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("stateair_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}
