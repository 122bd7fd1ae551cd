//! Typed tabular data produced by result parsing.

use serde::{Serialize, Serializer};
use std::fmt;

/// Column name used for single-column tables (plain lines, scalar lists, fallback).
pub const RESULT_COLUMN: &str = "result";

/// A single typed value.
///
/// Numbers keep their literal text so decimal values such as `12.50` survive
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(String),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn number(value: impl Into<String>) -> Self {
        Cell::Number(value.into())
    }

    /// String view of text and number cells.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Number(s) | Cell::Text(s) => Some(s),
            Cell::Null | Cell::Bool(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Number(s) | Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Number(s) | Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(value.to_string())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value.to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Ordered column names plus rows of cells.
///
/// Rows normally have exactly `columns.len()` cells. When row widths were
/// irregular, `columns` covers the widest row and shorter rows keep their own
/// length; see [`Table::is_ragged`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A one-column table named [`RESULT_COLUMN`].
    pub fn single_column(values: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            columns: vec![RESULT_COLUMN.to_string()],
            rows: values.into_iter().map(|v| vec![v]).collect(),
        }
    }

    /// The best-effort table holding the raw input in one cell.
    pub fn fallback(raw: impl Into<String>) -> Self {
        Self::single_column([Cell::Text(raw.into())])
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether some row is narrower than the column list.
    pub fn is_ragged(&self) -> bool {
        self.rows.iter().any(|r| r.len() != self.columns.len())
    }

    /// Cell at `row`, `column`.
    pub fn get(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// All cells of one column; rows too short to reach it are skipped.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |r| r.get(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fallback_shape() {
        let table = Table::fallback("garbage");
        assert_eq!(table.columns, vec![RESULT_COLUMN]);
        assert_eq!(table.rows, vec![vec![Cell::text("garbage")]]);
        assert!(!table.is_ragged());
    }

    #[test]
    fn test_ragged_detection() {
        let table = Table::new(
            vec!["Column_1".into(), "Column_2".into()],
            vec![vec![Cell::from(1), Cell::from(2)], vec![Cell::from(3)]],
        );
        assert!(table.is_ragged());
        assert_eq!(table.column_values(1).count(), 1);
        assert_eq!(table.get(1, 0), Some(&Cell::number("3")));
    }

    #[test]
    fn test_cell_serialization() {
        let row = vec![
            Cell::Null,
            Cell::Bool(true),
            Cell::number("12.50"),
            Cell::text("A"),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,true,"12.50","A"]"#);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Cell::from(None::<&str>), Cell::Null);
        assert_eq!(Cell::from(Some("x")), Cell::text("x"));
    }
}
