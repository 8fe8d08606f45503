// src/sink/mod.rs
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::OutputFormat;
use crate::error::HvsError;
use crate::process::MetricSeries;

pub mod csv;
pub mod parquet;
pub mod report;

pub const MSA_COLUMN: &str = "MSA_Name";
pub const YEAR_COLUMN: &str = "Year";
pub const QUARTER_COLUMN: &str = "Quarter";

/// Write a finished series to `path` in the requested format.
///
/// The table is encoded in full before anything touches `path`: bytes go to a
/// temp file in the same directory which is then renamed over the target, so
/// a failed run never leaves a partial table behind.
pub fn write_series(
    series: &MetricSeries,
    path: &Path,
    format: OutputFormat,
) -> Result<PathBuf, HvsError> {
    match format {
        OutputFormat::Csv => csv::write_csv(series, path)?,
        OutputFormat::Parquet => parquet::write_parquet(series, path)?,
    }
    Ok(path.to_path_buf())
}

/// Temp file next to `path`, so the final rename stays on one filesystem.
pub(crate) fn temp_beside(path: &Path) -> Result<NamedTempFile, HvsError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| sink_error(dir, e))?;
    NamedTempFile::new_in(dir).map_err(|e| sink_error(path, e))
}

pub(crate) fn persist(tmp: NamedTempFile, path: &Path) -> Result<(), HvsError> {
    tmp.persist(path).map_err(|e| sink_error(path, e.error))?;
    Ok(())
}

pub(crate) fn sink_error(path: &Path, e: impl std::fmt::Display) -> HvsError {
    HvsError::Sink {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
