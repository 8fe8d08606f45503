use std::collections::HashSet;

use tracing::{debug, warn};

use crate::metric::Metric;
use crate::process::{sort_long_rows, LongRow};

/// Merged long rows for one metric, sorted by `(area_name, year, quarter)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub metric: Metric,
    pub rows: Vec<LongRow>,
}

impl MetricSeries {
    pub fn area_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.area_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Concatenate the early and late long tables and sort them. Nothing is
/// deduplicated; overlapping keys are only reported.
pub fn merge(metric: Metric, early: Vec<LongRow>, late: Vec<LongRow>) -> MetricSeries {
    let (n_early, n_late) = (early.len(), late.len());
    let mut rows = early;
    rows.extend(late);
    sort_long_rows(&mut rows);

    let duplicates = rows.windows(2).filter(|w| w[0].key() == w[1].key()).count();
    if duplicates > 0 {
        warn!(%metric, duplicates, "eras overlap; duplicate (area, year, quarter) keys kept");
    }
    debug!(%metric, early = n_early, late = n_late, merged = rows.len(), "merged eras");

    MetricSeries { metric, rows }
}
