use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::HvsError;
use crate::process::raw_table::RawTable;
use crate::process::utils::{sanitize_area_name, HEADER_LABEL};
use crate::process::WideRow;

/// Where the data lives inside one era's worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    /// Title, notes and column-header rows above the first area.
    pub header_rows: usize,
    /// Source notes below the last area.
    pub footer_rows: usize,
    /// Area column followed by the Q1..Q4 rate columns. The margin-of-error
    /// column after each rate is skipped.
    pub columns: [usize; 5],
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            header_rows: 8,
            footer_rows: 3,
            columns: [1, 2, 4, 6, 8],
        }
    }
}

/// Strip boilerplate rows, select the area and quarter columns, and clean the
/// area names. Rows without a usable area name (blank separators, repeated
/// header labels) are dropped; a body with no area rows at all is malformed.
#[instrument(level = "debug", skip(table, layout), fields(source = %table.source_id))]
pub fn extract(table: &RawTable, layout: &TableLayout) -> Result<Vec<WideRow>, HvsError> {
    let needed = layout.columns.iter().max().map(|c| c + 1).unwrap_or(0);
    if table.width() < needed {
        return Err(HvsError::malformed(format!(
            "{} has {} columns, layout needs {}",
            table.source_id,
            table.width(),
            needed
        )));
    }
    let skipped = layout.header_rows + layout.footer_rows;
    if table.height() <= skipped {
        return Err(HvsError::malformed(format!(
            "{} has {} rows, nothing left after skipping {} header and {} footer rows",
            table.source_id,
            table.height(),
            layout.header_rows,
            layout.footer_rows
        )));
    }

    let body = &table.rows[layout.header_rows..table.height() - layout.footer_rows];
    let [area_col, q1, q2, q3, q4] = layout.columns;

    let rows: Vec<WideRow> = body
        .iter()
        .filter_map(|row| {
            let area_name = sanitize_area_name(&row[area_col].as_text()?);
            if area_name.is_empty() || area_name == HEADER_LABEL {
                return None;
            }
            Some(WideRow {
                area_name,
                quarters: [
                    row[q1].as_number(),
                    row[q2].as_number(),
                    row[q3].as_number(),
                    row[q4].as_number(),
                ],
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(HvsError::malformed(format!(
            "{}: no area rows in column {} of {} body rows",
            table.source_id,
            area_col,
            body.len()
        )));
    }

    debug!(
        body_rows = body.len(),
        kept = rows.len(),
        "extracted wide rows"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::raw_table::Cell;

    fn text(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    fn data_row(area: &str, values: [f64; 4]) -> Vec<Cell> {
        vec![
            Cell::Empty,
            text(area),
            Cell::Number(values[0]),
            Cell::Number(0.1),
            Cell::Number(values[1]),
            Cell::Number(0.2),
            Cell::Number(values[2]),
            Cell::Number(0.3),
            Cell::Number(values[3]),
            Cell::Number(0.4),
        ]
    }

    fn table_with(body: Vec<Vec<Cell>>) -> RawTable {
        let mut rows = vec![vec![text("Table 6a. Homeownership Rates")]];
        rows.extend((1..8).map(|_| vec![]));
        rows.extend(body);
        rows.push(vec![text("Source: U.S. Census Bureau")]);
        rows.push(vec![]);
        rows.push(vec![text("1/ footnote")]);
        RawTable::new("tab6a", rows)
    }

    #[test]
    fn selects_rate_columns_and_skips_margins() {
        let table = table_with(vec![data_row("1 Akron, OH", [68.0, 67.5, 67.1, 66.9])]);
        let rows = extract(&table, &TableLayout::default()).unwrap();
        assert_eq!(
            rows,
            vec![WideRow {
                area_name: "Akron, OH".into(),
                quarters: [Some(68.0), Some(67.5), Some(67.1), Some(66.9)],
            }]
        );
    }

    #[test]
    fn header_label_dropped_wherever_it_appears() {
        let mut header = vec![Cell::Empty; 10];
        header[1] = text("Metropolitan Statistical Area");
        let table = table_with(vec![
            data_row("Akron, OH", [1.0, 2.0, 3.0, 4.0]),
            header.clone(),
            vec![],
            data_row("Albany-Schenectady-Troy, NY", [5.0, 6.0, 7.0, 8.0]),
            header,
        ]);
        let rows = extract(&table, &TableLayout::default()).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.area_name.as_str()).collect();
        assert_eq!(names, vec!["Akron, OH", "Albany-Schenectady-Troy, NY"]);
        assert!(rows.iter().all(|r| !r.area_name.contains("Metropolitan")));
    }

    #[test]
    fn unparseable_values_are_missing() {
        let mut row = data_row("Akron, OH", [1.0, 2.0, 3.0, 4.0]);
        row[4] = text("(X)");
        row[8] = Cell::Empty;
        let rows = extract(&table_with(vec![row]), &TableLayout::default()).unwrap();
        assert_eq!(rows[0].quarters, [Some(1.0), None, Some(3.0), None]);
    }

    #[test]
    fn narrow_table_is_malformed() {
        let table = RawTable::new(
            "narrow",
            (0..20).map(|_| vec![text("x"), text("y")]).collect(),
        );
        let err = extract(&table, &TableLayout::default()).unwrap_err();
        assert!(matches!(err, HvsError::MalformedTable { .. }));
    }

    #[test]
    fn shifted_area_column_is_malformed() {
        let shifted = |area: &str| {
            let mut row = data_row("", [1.0, 2.0, 3.0, 4.0]);
            row[0] = text(area);
            row[1] = Cell::Empty;
            row
        };
        let table = table_with(vec![
            shifted("Akron, OH"),
            shifted("Albany-Schenectady-Troy, NY"),
            shifted("Albuquerque, NM"),
        ]);
        let err = extract(&table, &TableLayout::default()).unwrap_err();
        assert!(matches!(err, HvsError::MalformedTable { .. }));
        assert!(err.to_string().contains("no area rows"));
    }

    #[test]
    fn short_table_is_malformed() {
        let table = RawTable::new("short", (0..11).map(|_| vec![text("x"); 9]).collect());
        let err = extract(&table, &TableLayout::default()).unwrap_err();
        assert!(err.to_string().contains("nothing left"));
    }
}
