//! Tidy quarterly MSA series from the Census Housing Vacancies and
//! Homeownership (CPS/HVS) rate tables.

pub mod config;
pub mod error;
pub mod fetch;
pub mod metric;
pub mod pipeline;
pub mod process;
pub mod reconcile;
pub mod sink;

pub use config::PipelineConfig;
pub use error::{HvsError, MetricFailure, Stage};
pub use metric::{Era, Metric};
pub use pipeline::{MetricOutcome, Pipeline};
pub use reconcile::{RenameMap, RenameMode};
