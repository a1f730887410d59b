//! AQI categories and the breakpoint table used to classify concentrations.

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// An AQI category. The six ranked categories come first in ascending order,
/// followed by the catch-all [`Category::OutOfScale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    OutOfScale,
}

impl Category {
    /// Every category, in stacking order.
    pub const ALL: [Category; 7] = [
        Category::Good,
        Category::Moderate,
        Category::UnhealthySensitive,
        Category::Unhealthy,
        Category::VeryUnhealthy,
        Category::Hazardous,
        Category::OutOfScale,
    ];

    /// Categories that own a breakpoint interval, in canonical test order.
    pub const RANKED: [Category; 6] = [
        Category::Good,
        Category::Moderate,
        Category::UnhealthySensitive,
        Category::Unhealthy,
        Category::VeryUnhealthy,
        Category::Hazardous,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Good => "good",
            Category::Moderate => "moderate",
            Category::UnhealthySensitive => "unhealthy_sensitive",
            Category::Unhealthy => "unhealthy",
            Category::VeryUnhealthy => "very_unhealthy",
            Category::Hazardous => "hazardous",
            Category::OutOfScale => "out_of_scale",
        }
    }

    /// Human readable label used in the chart legend.
    pub fn label(self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthySensitive => "Unhealthy for sensitive groups",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very unhealthy",
            Category::Hazardous => "Hazardous",
            Category::OutOfScale => "Out of scale",
        }
    }

    /// Standard AQI color as an `(r, g, b)` triple.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Category::Good => (0x00, 0xe4, 0x00),
            Category::Moderate => (0xff, 0xff, 0x00),
            Category::UnhealthySensitive => (0xff, 0x7e, 0x00),
            Category::Unhealthy => (0xff, 0x00, 0x00),
            Category::VeryUnhealthy => (0x99, 0x00, 0x4c),
            Category::Hazardous => (0x7e, 0x00, 0x23),
            Category::OutOfScale => (0x00, 0x00, 0x00),
        }
    }

    /// Position of the category in [`Category::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive concentration interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub lo: f64,
    pub hi: f64,
}

impl Breakpoint {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

/// US EPA PM2.5 breakpoints (µg/m³).
static EPA_PM25: [(Category, Breakpoint); 6] = [
    (Category::Good, Breakpoint::new(0.0, 12.0)),
    (Category::Moderate, Breakpoint::new(12.1, 35.4)),
    (Category::UnhealthySensitive, Breakpoint::new(35.5, 55.4)),
    (Category::Unhealthy, Breakpoint::new(55.5, 150.4)),
    (Category::VeryUnhealthy, Breakpoint::new(150.5, 250.4)),
    (Category::Hazardous, Breakpoint::new(250.5, 500.4)),
];

/// Ordered mapping of ranked category to its breakpoint interval.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    entries: Vec<(Category, Breakpoint)>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::epa_pm25()
    }
}

impl CategoryTable {
    pub fn epa_pm25() -> Self {
        Self {
            entries: EPA_PM25.to_vec(),
        }
    }

    /// Builds a table from one interval per ranked category.
    ///
    /// Intervals must be finite, have `lo <= hi`, and be strictly ascending
    /// without overlap in canonical category order.
    pub fn new(bounds: [Breakpoint; 6]) -> Result<Self> {
        let entries: Vec<(Category, Breakpoint)> =
            Category::RANKED.iter().copied().zip(bounds).collect();

        let mut previous: Option<(Category, Breakpoint)> = None;
        for &(category, bp) in &entries {
            if !bp.lo.is_finite() || !bp.hi.is_finite() {
                bail!("breakpoint for {category} is not finite");
            }
            if bp.lo > bp.hi {
                bail!("breakpoint for {category} has lo {} > hi {}", bp.lo, bp.hi);
            }
            if let Some((prev_category, prev)) = previous {
                if bp.lo <= prev.hi {
                    bail!("breakpoint for {category} overlaps {prev_category}");
                }
            }
            previous = Some((category, bp));
        }

        Ok(Self { entries })
    }

    /// Loads breakpoints from a JSON object mapping each ranked category name
    /// to a `[lo, hi]` pair:
    /// ```json
    /// { "good": [0, 12], "moderate": [12.1, 35.4], ... }
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read breakpoints from {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("invalid breakpoints in {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mut raw: HashMap<String, (f64, f64)> = serde_json::from_str(content)?;

        let mut bounds = [Breakpoint::new(0.0, 0.0); 6];
        for (slot, category) in bounds.iter_mut().zip(Category::RANKED) {
            let (lo, hi) = raw
                .remove(category.name())
                .with_context(|| format!("missing category {category}"))?;
            *slot = Breakpoint::new(lo, hi);
        }
        if let Some(unknown) = raw.keys().next() {
            bail!("unknown category {unknown}");
        }

        Self::new(bounds)
    }

    /// Classifies a concentration. Intervals are tested in canonical order and
    /// the first match wins; anything unmatched is out of scale.
    pub fn classify(&self, value: f64) -> Category {
        self.entries
            .iter()
            .find(|(_, bp)| bp.contains(value))
            .map(|&(category, _)| category)
            .unwrap_or(Category::OutOfScale)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Breakpoint)> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let table = CategoryTable::epa_pm25();
        assert_eq!(table.classify(0.0), Category::Good);
        assert_eq!(table.classify(12.0), Category::Good);
        assert_eq!(table.classify(12.1), Category::Moderate);
        assert_eq!(table.classify(35.4), Category::Moderate);
        assert_eq!(table.classify(35.5), Category::UnhealthySensitive);
        assert_eq!(table.classify(55.4), Category::UnhealthySensitive);
        assert_eq!(table.classify(55.5), Category::Unhealthy);
        assert_eq!(table.classify(150.4), Category::Unhealthy);
        assert_eq!(table.classify(150.5), Category::VeryUnhealthy);
        assert_eq!(table.classify(250.4), Category::VeryUnhealthy);
        assert_eq!(table.classify(250.5), Category::Hazardous);
        assert_eq!(table.classify(500.4), Category::Hazardous);
    }

    #[test]
    fn test_classify_out_of_scale() {
        let table = CategoryTable::epa_pm25();
        assert_eq!(table.classify(500.5), Category::OutOfScale);
        assert_eq!(table.classify(-3.0), Category::OutOfScale);
        // gap between two intervals
        assert_eq!(table.classify(12.05), Category::OutOfScale);
    }

    #[test]
    fn test_classify_is_total() {
        let table = CategoryTable::epa_pm25();
        let mut v = -50.0;
        while v < 700.0 {
            let category = table.classify(v);
            assert!(Category::ALL.contains(&category));
            v += 0.7;
        }
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_from_json_custom_table() {
        let json = r#"{
            "good": [0, 50],
            "moderate": [51, 100],
            "unhealthy_sensitive": [101, 150],
            "unhealthy": [151, 200],
            "very_unhealthy": [201, 300],
            "hazardous": [301, 500]
        }"#;
        let table = CategoryTable::from_json(json).unwrap();
        assert_eq!(table.classify(50.0), Category::Good);
        assert_eq!(table.classify(75.0), Category::Moderate);
        assert_eq!(table.classify(501.0), Category::OutOfScale);
    }

    #[test]
    fn test_from_json_rejects_missing_category() {
        let json = r#"{ "good": [0, 12] }"#;
        assert!(CategoryTable::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_rejects_unknown_category() {
        let json = r#"{
            "good": [0, 12],
            "moderate": [12.1, 35.4],
            "unhealthy_sensitive": [35.5, 55.4],
            "unhealthy": [55.5, 150.4],
            "very_unhealthy": [150.5, 250.4],
            "hazardous": [250.5, 500.4],
            "apocalyptic": [500.5, 9999]
        }"#;
        assert!(CategoryTable::from_json(json).is_err());
    }

    #[test]
    fn test_new_rejects_overlap() {
        let mut bounds = [
            Breakpoint::new(0.0, 12.0),
            Breakpoint::new(12.1, 35.4),
            Breakpoint::new(35.5, 55.4),
            Breakpoint::new(55.5, 150.4),
            Breakpoint::new(150.5, 250.4),
            Breakpoint::new(250.5, 500.4),
        ];
        assert!(CategoryTable::new(bounds).is_ok());

        bounds[1] = Breakpoint::new(10.0, 35.4);
        assert!(CategoryTable::new(bounds).is_err());
    }

    #[test]
    fn test_new_rejects_inverted_interval() {
        let bounds = [
            Breakpoint::new(12.0, 0.0),
            Breakpoint::new(12.1, 35.4),
            Breakpoint::new(35.5, 55.4),
            Breakpoint::new(55.5, 150.4),
            Breakpoint::new(150.5, 250.4),
            Breakpoint::new(250.5, 500.4),
        ];
        assert!(CategoryTable::new(bounds).is_err());
    }
}
