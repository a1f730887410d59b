//! CSV parser for StateAir hourly PM2.5 exports.
//!
//! Rows whose value is a sentinel, unparsable, or missing are dropped without
//! being reported. Only the timestamp and value fields are decoded, so bytes
//! in other columns (a Latin-1 unit, say) never matter. Only failures of the
//! file itself surface as errors.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::analyzers::types::Reading;

/// Values meaning "no reading".
const SENTINELS: &[&str] = &["-999", "-1"];
const SENTINEL_VALUES: &[f64] = &[-999.0, -1.0];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Zero-based positions of the columns the parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub timestamp: usize,
    pub value: usize,
}

impl Default for ColumnLayout {
    /// StateAir layout: `Date (LST)` is column 2 and `Value` column 7.
    fn default() -> Self {
        Self {
            timestamp: 2,
            value: 7,
        }
    }
}

/// Lazy iterator over the valid readings of one CSV source.
pub struct ReadingReader<R> {
    records: ByteRecordsIntoIter<R>,
    layout: ColumnLayout,
}

impl<R: Read> ReadingReader<R> {
    /// Wraps a CSV source whose first line is a header.
    pub fn from_reader(reader: R, layout: ColumnLayout) -> Self {
        let records = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader)
            .into_byte_records();
        Self { records, layout }
    }
}

impl<R: Read> Iterator for ReadingReader<R> {
    type Item = Result<Reading>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            if let Some(reading) = parse_record(&record, self.layout) {
                return Some(Ok(reading));
            }
        }
    }
}

/// Opens `path` and returns a lazy reader over its valid readings.
///
/// # Errors
///
/// Returns an error if the file cannot be opened. Read failures past that
/// point are reported by the iterator itself.
pub fn read_readings(path: &Path, layout: ColumnLayout) -> Result<ReadingReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(ReadingReader::from_reader(file, layout))
}

fn parse_record(record: &ByteRecord, layout: ColumnLayout) -> Option<Reading> {
    let timestamp = parse_timestamp(field(record, layout.timestamp)?)?;
    let value = parse_value(field(record, layout.value)?)?;
    Some(Reading::new(timestamp, value))
}

/// Field `index` as text; `None` when absent or not UTF-8.
fn field(record: &ByteRecord, index: usize) -> Option<&str> {
    std::str::from_utf8(record.get(index)?).ok()
}

/// Parses a concentration, rejecting sentinels and non-finite values.
pub fn parse_value(raw: &str) -> Option<f64> {
    if raw.is_empty() || SENTINELS.contains(&raw) {
        return None;
    }
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() || SENTINEL_VALUES.contains(&value) {
        return None;
    }
    Some(value)
}

/// Parses a timestamp in any of the supported formats. Date-only values are
/// taken as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
