use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::info;

use super::{persist, sink_error, temp_beside, MSA_COLUMN, QUARTER_COLUMN, YEAR_COLUMN};
use crate::error::HvsError;
use crate::process::MetricSeries;

pub fn series_schema(value_field: &str) -> Schema {
    Schema::new(vec![
        Field::new(MSA_COLUMN, DataType::Utf8, false),
        Field::new(YEAR_COLUMN, DataType::Int32, false),
        Field::new(QUARTER_COLUMN, DataType::Utf8, false),
        Field::new(value_field, DataType::Float64, true),
    ])
}

pub fn to_record_batch(series: &MetricSeries) -> Result<RecordBatch, HvsError> {
    let schema = Arc::new(series_schema(series.metric.spec().value_field));
    let rows = &series.rows;

    let areas = Arc::new(StringArray::from_iter_values(
        rows.iter().map(|r| r.area_name.as_str()),
    )) as ArrayRef;
    let years = Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))) as ArrayRef;
    let quarters = Arc::new(StringArray::from_iter_values(
        rows.iter().map(|r| r.quarter.as_str()),
    )) as ArrayRef;
    let values = Arc::new(rows.iter().map(|r| r.value).collect::<Float64Array>()) as ArrayRef;

    RecordBatch::try_new(schema, vec![areas, years, quarters, values]).map_err(|e| {
        HvsError::Sink {
            path: series.metric.spec().output_stem.to_string(),
            message: format!("building record batch: {e}"),
        }
    })
}

pub fn write_parquet(series: &MetricSeries, path: &Path) -> Result<(), HvsError> {
    let batch = to_record_batch(series)?;
    let mut tmp = temp_beside(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    {
        let mut writer = ArrowWriter::try_new(tmp.as_file_mut(), batch.schema(), Some(props))
            .map_err(|e| sink_error(path, e))?;
        writer.write(&batch).map_err(|e| sink_error(path, e))?;
        writer.close().map_err(|e| sink_error(path, e))?;
    }
    persist(tmp, path)?;
    info!(metric = %series.metric, rows = series.rows.len(), path = %path.display(), "wrote parquet");
    Ok(())
}
