use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{persist, sink_error, temp_beside};
use crate::config::{OutputFormat, PipelineConfig};
use crate::error::HvsError;
use crate::metric::Metric;
use crate::pipeline::MetricResult;
use crate::reconcile::RenameMode;

pub const REPORT_FILE: &str = "run_report.json";

/// Summary of one run, written next to the output tables.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub rename_mode: RenameMode,
    pub output_format: OutputFormat,
    pub metrics: Vec<MetricReport>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MetricReport {
    Written {
        metric: Metric,
        path: PathBuf,
        rows: usize,
        areas: usize,
    },
    Failed {
        metric: Metric,
        stage: String,
        source_id: Option<String>,
        error: String,
    },
}

impl RunReport {
    pub fn new(config: &PipelineConfig, results: &[MetricResult]) -> Self {
        let metrics = results
            .iter()
            .map(|r| match r {
                Ok(o) => MetricReport::Written {
                    metric: o.metric,
                    path: o.path.clone(),
                    rows: o.rows,
                    areas: o.areas,
                },
                Err(f) => MetricReport::Failed {
                    metric: f.metric,
                    stage: f.stage.to_string(),
                    source_id: f.source_id.clone(),
                    error: f.error.to_string(),
                },
            })
            .collect();
        Self {
            generated_at: Utc::now(),
            rename_mode: config.rename_mode,
            output_format: config.output_format,
            metrics,
        }
    }

    pub fn failures(&self) -> usize {
        self.metrics
            .iter()
            .filter(|m| matches!(m, MetricReport::Failed { .. }))
            .count()
    }

    /// Pretty JSON with a trailing newline, written atomically.
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf, HvsError> {
        let path = out_dir.join(REPORT_FILE);
        let mut tmp = temp_beside(&path)?;
        serde_json::to_writer_pretty(&mut tmp, self).map_err(|e| sink_error(&path, e))?;
        tmp.write_all(b"\n").map_err(|e| sink_error(&path, e))?;
        persist(tmp, &path)?;
        Ok(path)
    }
}
