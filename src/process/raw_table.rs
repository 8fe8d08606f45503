/// A single spreadsheet cell after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text rendering of the cell, `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
        }
    }

    /// Numeric value of the cell. Text is parsed leniently; markers such as
    /// "(X)" or "-" yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawTable {
    /// Identifier of the workbook this grid was read from.
    pub source_id: String,
    /// Dense, rectangular rows. Row 0 is the first sheet row.
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Builds a rectangular table, padding short rows with `Cell::Empty` and
    /// dropping trailing rows that are entirely blank.
    pub fn new(source_id: impl Into<String>, mut rows: Vec<Vec<Cell>>) -> Self {
        while rows
            .last()
            .map(|r| r.iter().all(Cell::is_empty))
            .unwrap_or(false)
        {
            rows.pop();
        }
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in rows.iter_mut() {
            row.resize(width, Cell::Empty);
        }
        Self {
            source_id: source_id.into(),
            rows,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}
