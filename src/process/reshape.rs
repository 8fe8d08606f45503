use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::error::HvsError;
use crate::process::{sort_long_rows, LongRow, Quarter, WideRow};

/// `[last, last-1, .., first]`, the order source tables list their years in.
pub fn years_descending(first: i32, last: i32) -> Vec<i32> {
    (first..=last).rev().collect()
}

/// Assign years to each area's rows and melt the quarter columns into long
/// rows.
///
/// Within an area, the i-th row (in source order) gets `years[i]`. Every area
/// must have exactly `years.len()` rows; any other count would pair values
/// with the wrong year, so it fails with `YearAlignment` instead.
#[instrument(level = "debug", skip(rows, years), fields(rows = rows.len(), years = years.len()))]
pub fn reshape(rows: &[WideRow], years: &[i32]) -> Result<Vec<LongRow>, HvsError> {
    let mut by_area: BTreeMap<&str, Vec<&WideRow>> = BTreeMap::new();
    for row in rows {
        by_area.entry(row.area_name.as_str()).or_default().push(row);
    }

    if let Some((area, area_rows)) = by_area.iter().find(|(_, r)| r.len() != years.len()) {
        return Err(HvsError::YearAlignment {
            area: area.to_string(),
            expected: years.len(),
            found: area_rows.len(),
        });
    }

    let mut long = Vec::with_capacity(rows.len() * Quarter::ALL.len());
    for (area, area_rows) in &by_area {
        for (row, &year) in area_rows.iter().zip(years) {
            for (quarter, value) in Quarter::ALL.iter().zip(row.quarters) {
                long.push(LongRow {
                    area_name: area.to_string(),
                    year,
                    quarter: *quarter,
                    value,
                });
            }
        }
    }
    sort_long_rows(&mut long);

    debug!(areas = by_area.len(), long_rows = long.len(), "reshaped");
    Ok(long)
}
