use crate::analyzers::aggregate::aggregate_file;
use crate::analyzers::category::CategoryTable;
use crate::analyzers::types::MonthlyAggregate;
use crate::parser::ColumnLayout;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Lists the `*.csv` files directly inside `dir`, sorted by path. Symlinks are
/// followed, so a link to a regular file counts as one.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }

        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// Aggregates every file into one shared [`MonthlyAggregate`].
///
/// The first file that cannot be read aborts the whole pass.
pub fn aggregate_sources(
    sources: &[PathBuf],
    table: &CategoryTable,
    layout: ColumnLayout,
) -> Result<MonthlyAggregate> {
    let mut agg = MonthlyAggregate::new();

    for source in sources {
        let counted = aggregate_file(&mut agg, table, source, layout)?;
        info!(file = %source.display(), readings = counted, "Source processed");
    }

    Ok(agg)
}
