// src/process/mod.rs
use std::fmt;

pub mod extract;
pub mod merge;
pub mod raw_table;
pub mod reshape;
pub mod utils;
pub mod xlsx;

pub use extract::{extract, TableLayout};
pub use merge::{merge, MetricSeries};
pub use raw_table::{Cell, RawTable};
pub use reshape::{reshape, years_descending};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cleaned row of a wide source table: an area and its four quarters.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub area_name: String,
    pub quarters: [Option<f64>; 4],
}

/// One observation of the tidy output.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub area_name: String,
    pub year: i32,
    pub quarter: Quarter,
    pub value: Option<f64>,
}

impl LongRow {
    pub fn key(&self) -> (&str, i32, Quarter) {
        (self.area_name.as_str(), self.year, self.quarter)
    }
}

/// Sort ascending by `(area_name, year, quarter)`, stable for equal keys.
pub fn sort_long_rows(rows: &mut [LongRow]) {
    rows.sort_by(|a, b| a.key().cmp(&b.key()));
}

#[cfg(test)]
pub(crate) fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hvs_msa=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
