//! Column naming policy shared by every result shape.

use sqlscribe_core::{Cell, Diagnostic, Table};

/// Generic name of the 1-based column `n`.
pub fn generic_name(n: usize) -> String {
    format!("Column_{n}")
}

/// Build a table from positional rows.
///
/// The hint is used when every row is exactly as wide as the hint. Otherwise
/// the columns are `Column_1..Column_N` for the widest row, rows keep their own
/// length, and a [`Diagnostic::RowWidthMismatch`] is recorded.
pub fn name_rows(rows: Vec<Vec<Cell>>, hint: &[String], diagnostics: &mut Vec<Diagnostic>) -> Table {
    if rows.is_empty() {
        return Table::empty();
    }

    if !hint.is_empty() && rows.iter().all(|row| row.len() == hint.len()) {
        return Table::new(hint.to_vec(), rows);
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or_default();
    let expected = if hint.is_empty() { width } else { hint.len() };
    if let Some(found) = rows.iter().map(Vec::len).find(|len| *len != expected) {
        tracing::debug!(expected, found, "row width does not match column names");
        diagnostics.push(Diagnostic::RowWidthMismatch { expected, found });
    }

    Table::new((1..=width).map(generic_name).collect(), rows)
}
