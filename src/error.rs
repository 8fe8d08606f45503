use std::fmt;

use thiserror::Error;

use crate::metric::Metric;

#[derive(Error, Debug)]
pub enum HvsError {
    #[error("fetching {source_id}: {message}")]
    Fetch { source_id: String, message: String },

    #[error("parsing workbook: {message}")]
    Parse { message: String },

    #[error("malformed table: {message}")]
    MalformedTable { message: String },

    #[error("area {area:?} has {found} rows but {expected} years were supplied")]
    YearAlignment {
        area: String,
        expected: usize,
        found: usize,
    },

    #[error("writing {path}: {message}")]
    Sink { path: String, message: String },

    #[error("config: {message}")]
    Config { message: String },
}

impl HvsError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedTable {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Pipeline stage a metric failed in. Renaming and merging cannot fail, so
/// they have no stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
    Extract,
    Reshape,
    Write,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Extract => "extract",
            Stage::Reshape => "reshape",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single metric's pipeline failure. Other metrics are unaffected.
#[derive(Error, Debug)]
#[error("{metric} failed at {stage}{}: {error}", source_suffix(.source_id))]
pub struct MetricFailure {
    pub metric: Metric,
    pub stage: Stage,
    pub source_id: Option<String>,
    #[source]
    pub error: HvsError,
}

fn source_suffix(source_id: &Option<String>) -> String {
    match source_id {
        Some(id) => format!(" ({id})"),
        None => String::new(),
    }
}

impl MetricFailure {
    pub fn new(metric: Metric, stage: Stage, error: HvsError) -> Self {
        Self {
            metric,
            stage,
            source_id: None,
            error,
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}
