use std::io::Write;
use std::path::Path;

use tracing::info;

use super::{persist, sink_error, temp_beside, MSA_COLUMN, QUARTER_COLUMN, YEAR_COLUMN};
use crate::error::HvsError;
use crate::process::utils::format_value;
use crate::process::MetricSeries;

/// Encode the whole series as CSV in memory.
pub fn encode_csv(series: &MetricSeries) -> Result<Vec<u8>, HvsError> {
    let value_field = series.metric.spec().value_field;
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let to_err = |e: csv::Error| HvsError::Sink {
        path: series.metric.spec().output_stem.to_string(),
        message: e.to_string(),
    };

    wtr.write_record([MSA_COLUMN, YEAR_COLUMN, QUARTER_COLUMN, value_field])
        .map_err(to_err)?;
    for row in &series.rows {
        let year = row.year.to_string();
        let value = format_value(row.value);
        wtr.write_record([
            row.area_name.as_str(),
            year.as_str(),
            row.quarter.as_str(),
            value.as_str(),
        ])
        .map_err(to_err)?;
    }
    wtr.into_inner().map_err(|e| HvsError::Sink {
        path: series.metric.spec().output_stem.to_string(),
        message: e.to_string(),
    })
}

pub fn write_csv(series: &MetricSeries, path: &Path) -> Result<(), HvsError> {
    let bytes = encode_csv(series)?;
    let mut tmp = temp_beside(path)?;
    tmp.write_all(&bytes).map_err(|e| sink_error(path, e))?;
    tmp.flush().map_err(|e| sink_error(path, e))?;
    persist(tmp, path)?;
    info!(metric = %series.metric, rows = series.rows.len(), path = %path.display(), "wrote csv");
    Ok(())
}
