//! Run configuration.
//!
//! [`Config`] is built once at startup from the environment (a `.env` file is
//! loaded first by the binary) and then adjusted by command-line flags. It is
//! never mutated while data is processed.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::analyzers::category::CategoryTable;
use crate::analyzers::series::YearRange;
use crate::chart::ChartStyle;
use crate::parser::ColumnLayout;

pub const DEFAULT_DATA_ROOT: &str = "_data";
pub const DEFAULT_CITY: &str = "shanghai";

/// Checked in order when no font is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Folder holding one sub-folder per city; charts are written here.
    pub data_root: PathBuf,
    pub default_city: String,
    pub categories: CategoryTable,
    pub layout: ColumnLayout,
    pub chart: ChartStyle,
    pub font_path: Option<PathBuf>,
    pub years: YearRange,
    /// Where to write the monthly counts as CSV, if anywhere.
    pub export_csv: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            default_city: DEFAULT_CITY.to_string(),
            categories: CategoryTable::default(),
            layout: ColumnLayout::default(),
            chart: ChartStyle::default(),
            font_path: None,
            years: YearRange::default(),
            export_csv: None,
        }
    }
}

impl Config {
    /// Reads `STATEAIR_*` variables from the process environment.
    ///
    /// | Variable                    | Default     |
    /// |-----------------------------|-------------|
    /// | `STATEAIR_DATA_ROOT`        | `_data`     |
    /// | `STATEAIR_DEFAULT_CITY`     | `shanghai`  |
    /// | `STATEAIR_FONT_PATH`        | first system font found |
    /// | `STATEAIR_TIMESTAMP_COLUMN` | `2`         |
    /// | `STATEAIR_VALUE_COLUMN`     | `7`         |
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(root) = std::env::var("STATEAIR_DATA_ROOT") {
            config.data_root = PathBuf::from(root);
        }
        if let Ok(city) = std::env::var("STATEAIR_DEFAULT_CITY") {
            config.default_city = city;
        }
        if let Some(column) = env_usize("STATEAIR_TIMESTAMP_COLUMN")? {
            config.layout.timestamp = column;
        }
        if let Some(column) = env_usize("STATEAIR_VALUE_COLUMN")? {
            config.layout.value = column;
        }

        config.font_path = std::env::var("STATEAIR_FONT_PATH")
            .ok()
            .map(PathBuf::from)
            .or_else(find_system_font);

        Ok(config)
    }

    /// Replaces the default breakpoints with the ones in a JSON file.
    pub fn load_categories(&mut self, path: &Path) -> Result<()> {
        self.categories = CategoryTable::load(path)?;
        Ok(())
    }

    /// Folder holding the CSV files of `city`. City names are case-insensitive.
    pub fn city_dir(&self, city: &str) -> PathBuf {
        self.data_root.join(city.to_lowercase())
    }
}

fn env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a column index, got '{raw}'")),
        Err(_) => Ok(None),
    }
}

fn find_system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}
