//! Data types used by the aggregation pipeline.

use crate::analyzers::category::Category;
use chrono::{Datelike, NaiveDateTime};
use std::collections::BTreeMap;
use std::ops::{AddAssign, Index};

/// A single valid hourly sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }

    pub fn month_key(&self) -> MonthKey {
        MonthKey::from(&self.timestamp)
    }
}

/// Calendar month a bucket belongs to. Orders by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    /// 1 = January.
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl From<&NaiveDateTime> for MonthKey {
    fn from(ts: &NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }
}

/// One counter per [`Category`], indexed in [`Category::ALL`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts([u64; 7]);

impl CategoryCounts {
    pub fn increment(&mut self, category: Category) {
        self.0[category.index()] += 1;
    }

    pub fn get(&self, category: Category) -> u64 {
        self.0[category.index()]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

impl Index<Category> for CategoryCounts {
    type Output = u64;

    fn index(&self, category: Category) -> &u64 {
        &self.0[category.index()]
    }
}

impl AddAssign<&CategoryCounts> for CategoryCounts {
    fn add_assign(&mut self, other: &CategoryCounts) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            *mine += theirs;
        }
    }
}

/// Month buckets accumulated across every input file for one city.
///
/// Buckets are created lazily by [`crate::analyzers::aggregate::aggregate_reading`]
/// and never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyAggregate {
    buckets: BTreeMap<MonthKey, CategoryCounts>,
}

impl MonthlyAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bucket for `key`, creating an all-zero one if absent.
    pub fn bucket_mut(&mut self, key: MonthKey) -> &mut CategoryCounts {
        self.buckets.entry(key).or_default()
    }

    pub fn get(&self, key: &MonthKey) -> Option<&CategoryCounts> {
        self.buckets.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets in ascending `(year, month)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &CategoryCounts)> {
        self.buckets.iter()
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.buckets.keys().map(|k| k.year).collect();
        years.dedup();
        years
    }

    /// Number of readings counted across all buckets.
    pub fn total_readings(&self) -> u64 {
        self.buckets.values().map(CategoryCounts::total).sum()
    }
}

/// Per-year view with exactly twelve month slots, January first.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    pub year: i32,
    pub months: [CategoryCounts; 12],
}

impl YearSeries {
    /// Height of the tallest stacked bar of the year.
    pub fn max_stack(&self) -> u64 {
        self.months.iter().map(CategoryCounts::total).max().unwrap_or(0)
    }

    /// Category totals over the whole year.
    pub fn totals(&self) -> CategoryCounts {
        let mut totals = CategoryCounts::default();
        for month in &self.months {
            totals += month;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_month_key_from_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2013, 11, 30)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        assert_eq!(MonthKey::from(&ts), MonthKey::new(2013, 11));
    }

    #[test]
    fn test_month_key_ordering() {
        assert!(MonthKey::new(2011, 12) < MonthKey::new(2012, 1));
        assert!(MonthKey::new(2012, 2) < MonthKey::new(2012, 10));
    }

    #[test]
    fn test_category_counts_total() {
        let mut counts = CategoryCounts::default();
        counts.increment(Category::Good);
        counts.increment(Category::Good);
        counts.increment(Category::OutOfScale);

        assert_eq!(counts[Category::Good], 2);
        assert_eq!(counts.get(Category::OutOfScale), 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_years_are_deduplicated() {
        let mut agg = MonthlyAggregate::new();
        agg.bucket_mut(MonthKey::new(2012, 5));
        agg.bucket_mut(MonthKey::new(2011, 1));
        agg.bucket_mut(MonthKey::new(2011, 7));

        assert_eq!(agg.years(), vec![2011, 2012]);
        assert_eq!(agg.len(), 3);
    }
}
