//! Raw results as handed over by an executor.

use serde_json::Value;
use sqlscribe_core::Cell;

/// One raw query result before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    /// Already-typed rows of scalar cells.
    Rows(Vec<Vec<Cell>>),
    /// Rows of named fields, in field order.
    Records(Vec<Vec<(String, Cell)>>),
    /// A flat list of scalars.
    Values(Vec<Cell>),
    /// Serialized or line-oriented text.
    Text(String),
}

impl RawResult {
    /// Convert a JSON document.
    ///
    /// Arrays of arrays become [`RawResult::Rows`], arrays of objects
    /// [`RawResult::Records`], other arrays [`RawResult::Values`]. A JSON string
    /// is taken as result text; any other value is kept as its JSON text.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => RawResult::Text(text),
            Value::Array(items) if items.is_empty() => RawResult::Rows(Vec::new()),
            Value::Array(items) if items.iter().all(Value::is_array) => RawResult::Rows(
                items
                    .into_iter()
                    .map(|row| match row {
                        Value::Array(cells) => cells.into_iter().map(json_cell).collect(),
                        other => vec![json_cell(other)],
                    })
                    .collect(),
            ),
            Value::Array(items) if items.iter().all(Value::is_object) => RawResult::Records(
                items
                    .into_iter()
                    .map(|record| match record {
                        Value::Object(fields) => fields
                            .into_iter()
                            .map(|(name, value)| (name, json_cell(value)))
                            .collect(),
                        other => vec![(String::new(), json_cell(other))],
                    })
                    .collect(),
            ),
            Value::Array(items) => RawResult::Values(items.into_iter().map(json_cell).collect()),
            other => RawResult::Text(other.to_string()),
        }
    }

    /// Whether the result holds no data at all.
    pub fn is_empty(&self) -> bool {
        match self {
            RawResult::Rows(rows) => rows.is_empty(),
            RawResult::Records(records) => records.is_empty(),
            RawResult::Values(values) => values.is_empty(),
            RawResult::Text(text) => text.trim().is_empty(),
        }
    }
}

fn json_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(b),
        Value::Number(n) => Cell::Number(n.to_string()),
        Value::String(s) => Cell::Text(s),
        nested => Cell::Text(nested.to_string()),
    }
}

impl From<&str> for RawResult {
    fn from(text: &str) -> Self {
        RawResult::Text(text.to_string())
    }
}

impl From<String> for RawResult {
    fn from(text: String) -> Self {
        RawResult::Text(text)
    }
}

impl From<Vec<Vec<Cell>>> for RawResult {
    fn from(rows: Vec<Vec<Cell>>) -> Self {
        RawResult::Rows(rows)
    }
}

impl From<Vec<Cell>> for RawResult {
    fn from(values: Vec<Cell>) -> Self {
        RawResult::Values(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_json_rows() {
        let raw = RawResult::from_json(json!([[1, "Ann", null], [2, "Bob", true]]));
        assert_eq!(
            raw,
            RawResult::Rows(vec![
                vec![Cell::number("1"), Cell::text("Ann"), Cell::Null],
                vec![Cell::number("2"), Cell::text("Bob"), Cell::Bool(true)],
            ])
        );
    }

    #[test]
    fn test_json_records_keep_field_order() {
        let raw = RawResult::from_json(json!([{"Name": "Ann", "Age": 30}]));
        assert_eq!(
            raw,
            RawResult::Records(vec![vec![
                ("Name".to_string(), Cell::text("Ann")),
                ("Age".to_string(), Cell::number("30")),
            ]])
        );
    }

    #[test]
    fn test_json_scalars_and_text() {
        assert_eq!(
            RawResult::from_json(json!([1.5, "x"])),
            RawResult::Values(vec![Cell::number("1.5"), Cell::text("x")])
        );
        assert_eq!(
            RawResult::from_json(json!("[(1,)]")),
            RawResult::Text("[(1,)]".into())
        );
        assert_eq!(RawResult::from_json(json!(42)), RawResult::Text("42".into()));
    }

    #[test]
    fn test_is_empty() {
        assert!(RawResult::from_json(json!([])).is_empty());
        assert!(RawResult::from("  \n").is_empty());
        assert!(!RawResult::from("x").is_empty());
    }
}
