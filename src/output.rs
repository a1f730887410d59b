//! Output formatting and persistence.
//!
//! Supports the chart PNG, a CSV export of monthly counts, and logging or
//! printing per-year summaries.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use image::RgbImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::category::Category;
use crate::analyzers::types::{CategoryCounts, MonthlyAggregate, YearSeries};
use crate::chart::RenderedChart;

/// One exported row: the counts of a single month bucket.
#[derive(Debug, Serialize)]
pub struct MonthlyRow {
    pub year: i32,
    pub month: u32,
    pub good: u64,
    pub moderate: u64,
    pub unhealthy_sensitive: u64,
    pub unhealthy: u64,
    pub very_unhealthy: u64,
    pub hazardous: u64,
    pub out_of_scale: u64,
    pub total: u64,
}

/// Category totals of one year.
#[derive(Debug, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub good: u64,
    pub moderate: u64,
    pub unhealthy_sensitive: u64,
    pub unhealthy: u64,
    pub very_unhealthy: u64,
    pub hazardous: u64,
    pub out_of_scale: u64,
    pub total: u64,
}

impl MonthlyRow {
    fn new(year: i32, month: u32, counts: &CategoryCounts) -> Self {
        Self {
            year,
            month,
            good: counts[Category::Good],
            moderate: counts[Category::Moderate],
            unhealthy_sensitive: counts[Category::UnhealthySensitive],
            unhealthy: counts[Category::Unhealthy],
            very_unhealthy: counts[Category::VeryUnhealthy],
            hazardous: counts[Category::Hazardous],
            out_of_scale: counts[Category::OutOfScale],
            total: counts.total(),
        }
    }
}

impl YearSummary {
    fn new(year: i32, counts: &CategoryCounts) -> Self {
        Self {
            year,
            good: counts[Category::Good],
            moderate: counts[Category::Moderate],
            unhealthy_sensitive: counts[Category::UnhealthySensitive],
            unhealthy: counts[Category::Unhealthy],
            very_unhealthy: counts[Category::VeryUnhealthy],
            hazardous: counts[Category::Hazardous],
            out_of_scale: counts[Category::OutOfScale],
            total: counts.total(),
        }
    }
}

/// Name of the chart file: `stateair-<city>-<YYYYMMDDHHMMSS>.png`.
pub fn output_file_name<Tz: TimeZone>(city: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "stateair-{}-{}.png",
        city.to_lowercase(),
        at.format("%Y%m%d%H%M%S")
    )
}

/// Encodes a rendered chart as PNG at `path`.
pub fn save_png(chart: &RenderedChart, path: &Path) -> Result<()> {
    let img = RgbImage::from_raw(chart.width, chart.height, chart.pixels.clone())
        .context("chart buffer does not match its dimensions")?;
    img.save(path)
        .with_context(|| format!("failed to write chart to {}", path.display()))?;

    info!(path = %path.display(), "Chart written");
    Ok(())
}

/// Writes one CSV row per month bucket, replacing any existing file.
pub fn write_monthly_csv(path: &Path, agg: &MonthlyAggregate) -> Result<()> {
    debug!(path = %path.display(), buckets = agg.len(), "Writing monthly CSV");

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for (key, counts) in agg.iter() {
        writer.serialize(MonthlyRow::new(key.year, key.month, counts))?;
    }
    writer.flush()?;

    Ok(())
}

pub fn year_summaries(series: &[YearSeries]) -> Vec<YearSummary> {
    series
        .iter()
        .map(|s| YearSummary::new(s.year, &s.totals()))
        .collect()
}

/// Logs the series using Rust's debug pretty-print format.
pub fn print_pretty(series: &[YearSeries]) {
    for s in series {
        debug!("{:#?}", s);
    }
}

/// Prints per-year summaries to stdout as pretty JSON.
pub fn print_json(series: &[YearSeries]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&year_summaries(series))?);
    Ok(())
}

/// Resolves the chart path inside `dir`.
pub fn chart_path<Tz: TimeZone>(dir: &Path, city: &str, at: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    dir.join(output_file_name(city, at))
}
