use crate::analyzers::types::{CategoryCounts, MonthKey, MonthlyAggregate, YearSeries};
use anyhow::{Result, bail};

/// Optional inclusive year window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl YearRange {
    /// Builds a window, rejecting a start year after the end year.
    pub fn new(start: Option<i32>, end: Option<i32>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                bail!("start year {s} is after end year {e}");
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start.is_none_or(|s| year >= s) && self.end.is_none_or(|e| year <= e)
    }
}

/// Splits the aggregate into one [`YearSeries`] per year, ascending.
///
/// Every series has twelve slots; months without a bucket are all zero, the
/// same as a month whose readings were all zero.
pub fn build_series(agg: &MonthlyAggregate) -> Vec<YearSeries> {
    build_series_in_range(agg, YearRange::default())
}

/// Like [`build_series`], keeping only years inside `range`.
pub fn build_series_in_range(agg: &MonthlyAggregate, range: YearRange) -> Vec<YearSeries> {
    agg.years()
        .into_iter()
        .filter(|&year| range.contains(year))
        .map(|year| YearSeries {
            year,
            months: std::array::from_fn(|i| {
                agg.get(&MonthKey::new(year, i as u32 + 1))
                    .copied()
                    .unwrap_or_default()
            }),
        })
        .collect()
}

/// Tallest stacked bar across all series, used to scale the chart.
pub fn max_stack(series: &[YearSeries]) -> u64 {
    series.iter().map(YearSeries::max_stack).max().unwrap_or(0)
}

/// First and last year of an ascending series list.
pub fn year_bounds(series: &[YearSeries]) -> Option<(i32, i32)> {
    Some((series.first()?.year, series.last()?.year))
}

/// Sum of every month of every series.
pub fn grand_total(series: &[YearSeries]) -> CategoryCounts {
    let mut total = CategoryCounts::default();
    for s in series {
        total += &s.totals();
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::category::Category;

    fn agg_with(keys: &[(i32, u32, Category)]) -> MonthlyAggregate {
        let mut agg = MonthlyAggregate::new();
        for &(year, month, category) in keys {
            agg.bucket_mut(MonthKey::new(year, month)).increment(category);
        }
        agg
    }

    #[test]
    fn test_twelve_slots_zero_filled() {
        let agg = agg_with(&[(2011, 3, Category::Good), (2011, 3, Category::Hazardous)]);
        let series = build_series(&agg);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].year, 2011);
        assert_eq!(series[0].months.len(), 12);
        assert_eq!(series[0].months[2][Category::Good], 1);
        assert_eq!(series[0].months[2][Category::Hazardous], 1);
        for (i, month) in series[0].months.iter().enumerate() {
            if i != 2 {
                assert_eq!(month.total(), 0);
            }
        }
    }

    #[test]
    fn test_years_ascending() {
        let agg = agg_with(&[
            (2012, 12, Category::Moderate),
            (2011, 1, Category::Good),
            (2012, 1, Category::Good),
        ]);
        let years: Vec<i32> = build_series(&agg).iter().map(|s| s.year).collect();
        assert_eq!(years, vec![2011, 2012]);
    }

    #[test]
    fn test_empty_aggregate_yields_no_series() {
        assert!(build_series(&MonthlyAggregate::new()).is_empty());
    }

    #[test]
    fn test_year_range_filter() {
        let agg = agg_with(&[
            (2011, 1, Category::Good),
            (2012, 1, Category::Good),
            (2013, 1, Category::Good),
            (2014, 1, Category::Good),
        ]);
        let range = YearRange {
            start: Some(2012),
            end: Some(2013),
        };
        let years: Vec<i32> = build_series_in_range(&agg, range)
            .iter()
            .map(|s| s.year)
            .collect();
        assert_eq!(years, vec![2012, 2013]);

        let open_end = YearRange {
            start: Some(2014),
            end: None,
        };
        assert_eq!(build_series_in_range(&agg, open_end).len(), 1);
    }

    #[test]
    fn test_year_range_rejects_inverted_bounds() {
        assert!(YearRange::new(Some(2015), Some(2012)).is_err());

        let single = YearRange::new(Some(2013), Some(2013)).unwrap();
        assert!(single.contains(2013));
        assert!(!single.contains(2012));
        assert!(YearRange::new(Some(2015), None).is_ok());
        assert!(YearRange::new(None, Some(2012)).is_ok());
    }

    #[test]
    fn test_max_stack_and_bounds() {
        let agg = agg_with(&[
            (2011, 1, Category::Good),
            (2011, 1, Category::Good),
            (2013, 6, Category::Unhealthy),
        ]);
        let series = build_series(&agg);
        assert_eq!(max_stack(&series), 2);
        assert_eq!(year_bounds(&series), Some((2011, 2013)));
        assert_eq!(grand_total(&series).total(), 3);
        assert_eq!(year_bounds(&[]), None);
    }
}
