use crate::analyzers::category::CategoryTable;
use crate::analyzers::types::{MonthlyAggregate, Reading};
use crate::parser::{ColumnLayout, read_readings};
use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// Counts one reading into the bucket for its `(year, month)`.
///
/// The bucket is created with all counters at zero if this is the first
/// reading of the month. Exactly one counter is incremented.
pub fn aggregate_reading(agg: &mut MonthlyAggregate, table: &CategoryTable, reading: &Reading) {
    let category = table.classify(reading.value);
    agg.bucket_mut(reading.month_key()).increment(category);
}

/// Feeds every valid reading of `path` into `agg`.
///
/// Returns the number of readings counted. Any error reading the file aborts
/// the pass; buckets already touched keep their counts.
#[tracing::instrument(skip(agg, table), fields(path = %path.display()))]
pub fn aggregate_file(
    agg: &mut MonthlyAggregate,
    table: &CategoryTable,
    path: &Path,
    layout: ColumnLayout,
) -> Result<u64> {
    let mut counted = 0u64;

    for reading in read_readings(path, layout)? {
        aggregate_reading(agg, table, &reading?);
        counted += 1;
    }

    debug!(counted, buckets = agg.len(), "File aggregated");
    Ok(counted)
}

/// Aggregates a set of readings from scratch.
pub fn aggregate_readings<'a, I>(table: &CategoryTable, readings: I) -> MonthlyAggregate
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut agg = MonthlyAggregate::new();
    for reading in readings {
        aggregate_reading(&mut agg, table, reading);
    }
    agg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::category::Category;
    use crate::analyzers::types::MonthKey;
    use crate::parser::ReadingReader;
    use chrono::NaiveDate;

    fn reading(y: i32, m: u32, d: u32, h: u32, value: f64) -> Reading {
        let ts = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap();
        Reading::new(ts, value)
    }

    #[test]
    fn test_single_good_reading() {
        let table = CategoryTable::default();
        let mut agg = MonthlyAggregate::new();
        aggregate_reading(&mut agg, &table, &reading(2011, 3, 5, 0, 5.0));

        let bucket = agg.get(&MonthKey::new(2011, 3)).unwrap();
        assert_eq!(bucket[Category::Good], 1);
        for category in Category::ALL.iter().skip(1) {
            assert_eq!(bucket[*category], 0);
        }
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_bucket_sum_matches_readings() {
        let table = CategoryTable::default();
        let readings = vec![
            reading(2012, 1, 1, 0, 3.0),
            reading(2012, 1, 1, 1, 12.0),
            reading(2012, 1, 1, 2, 12.1),
            reading(2012, 1, 2, 0, 70.0),
            reading(2012, 1, 31, 23, 700.0),
            reading(2012, 2, 1, 0, 40.0),
            reading(2012, 2, 15, 0, 300.0),
        ];
        let agg = aggregate_readings(&table, &readings);

        let jan = agg.get(&MonthKey::new(2012, 1)).unwrap();
        assert_eq!(jan.total(), 5);
        assert_eq!(jan[Category::Good], 2);
        assert_eq!(jan[Category::Moderate], 1);
        assert_eq!(jan[Category::Unhealthy], 1);
        assert_eq!(jan[Category::OutOfScale], 1);

        let feb = agg.get(&MonthKey::new(2012, 2)).unwrap();
        assert_eq!(feb.total(), 2);
        assert_eq!(agg.total_readings(), readings.len() as u64);
    }

    #[test]
    fn test_order_independent_and_idempotent() {
        let table = CategoryTable::default();
        let mut readings = vec![
            reading(2013, 6, 1, 0, 20.0),
            reading(2013, 6, 2, 0, 60.0),
            reading(2014, 1, 1, 0, 1.0),
        ];
        let first = aggregate_readings(&table, &readings);
        let second = aggregate_readings(&table, &readings);
        readings.reverse();
        let reversed = aggregate_readings(&table, &readings);

        assert_eq!(first, second);
        assert_eq!(first, reversed);
    }

    #[test]
    fn test_sentinel_only_input_creates_no_bucket() {
        let data = "Site,Parameter,Date (LST),Year,Month,Day,Hour,Value,Unit,Duration,QC Name\n\
                    Shanghai,PM2.5,2011-01-01 00:00,2011,1,1,0,-999,µg/m³,1 Hr,Missing\n";
        let table = CategoryTable::default();
        let mut agg = MonthlyAggregate::new();
        for r in ReadingReader::from_reader(data.as_bytes(), ColumnLayout::default()) {
            aggregate_reading(&mut agg, &table, &r.unwrap());
        }
        assert!(agg.is_empty());
    }

    #[test]
    fn test_aggregate_file_merges_into_shared_map() {
        let dir = tempfile::tempdir().unwrap();
        let header = "Site,Parameter,Date (LST),Year,Month,Day,Hour,Value,Unit,Duration,QC Name\n";
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(
            &a,
            format!("{header}X,PM2.5,2011-05-01 00:00,2011,5,1,0,10,u,1 Hr,Valid\n"),
        )
        .unwrap();
        std::fs::write(
            &b,
            format!(
                "{header}X,PM2.5,2011-05-02 00:00,2011,5,2,0,100,u,1 Hr,Valid\n\
                 X,PM2.5,2011-05-02 01:00,2011,5,2,1,-999,u,1 Hr,Missing\n"
            ),
        )
        .unwrap();

        let table = CategoryTable::default();
        let mut agg = MonthlyAggregate::new();
        assert_eq!(aggregate_file(&mut agg, &table, &a, ColumnLayout::default()).unwrap(), 1);
        assert_eq!(aggregate_file(&mut agg, &table, &b, ColumnLayout::default()).unwrap(), 1);

        let may = agg.get(&MonthKey::new(2011, 5)).unwrap();
        assert_eq!(may.total(), 2);
        assert_eq!(may[Category::Good], 1);
        assert_eq!(may[Category::Unhealthy], 1);
    }

    #[test]
    fn test_aggregate_file_missing_file_errors() {
        let table = CategoryTable::default();
        let mut agg = MonthlyAggregate::new();
        let result = aggregate_file(
            &mut agg,
            &table,
            Path::new("/nonexistent/2011.csv"),
            ColumnLayout::default(),
        );
        assert!(result.is_err());
    }
}
