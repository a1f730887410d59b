//! Monthly AQI aggregation.
//!
//! This module classifies hourly PM2.5 readings against a breakpoint table,
//! counts them per calendar month across every input file of a city, and
//! reshapes the counts into per-year series ready for charting.

pub mod aggregate;
pub mod analyzer;
pub mod category;
pub mod series;
pub mod types;
