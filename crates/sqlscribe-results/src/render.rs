//! Text renderings of tables and raw results.

use sqlscribe_core::{Cell, Table};

use crate::literal::write_scalar;
use crate::raw::RawResult;

/// Shown for a result with no rows.
pub const EMPTY_RESULT_TEXT: &str = "查询结果为空";

/// Serialize rows as the bracketed tuple text [`ResultParser`] reads back.
///
/// [`ResultParser`]: crate::ResultParser
pub fn render_literal(table: &Table) -> String {
    let mut out = String::from("[");
    for (i, row) in table.rows.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('(');
        for (j, cell) in row.iter().enumerate() {
            if j > 0 {
                out.push_str(", ");
            }
            // Writing into a String cannot fail.
            let _ = write_scalar(&mut out, cell);
        }
        if row.len() == 1 {
            out.push(',');
        }
        out.push(')');
    }
    out.push(']');
    out
}

/// Human-readable view of a raw result, one `Row N:` line per row.
pub fn render_raw(raw: &RawResult) -> String {
    if raw.is_empty() {
        return EMPTY_RESULT_TEXT.to_string();
    }
    match raw {
        RawResult::Text(text) => text.clone(),
        RawResult::Values(values) => values
            .iter()
            .map(Cell::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        RawResult::Rows(rows) => rows
            .iter()
            .enumerate()
            .map(|(i, row)| format!("Row {}: {}", i + 1, join_cells(row.iter())))
            .collect::<Vec<_>>()
            .join("\n"),
        RawResult::Records(records) => records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let fields = record
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Row {}: {}", i + 1, fields)
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a Cell>) -> String {
    cells.map(Cell::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_literal() {
        let table = Table::new(
            vec!["Name".into(), "Price".into(), "Note".into()],
            vec![
                vec![Cell::text("O'Brien"), Cell::number("12.50"), Cell::Null],
                vec![Cell::text("B"), Cell::number("NaN"), Cell::Bool(false)],
            ],
        );
        assert_eq!(
            render_literal(&table),
            r"[('O\'Brien', 12.50, None), ('B', Decimal('NaN'), False)]"
        );
    }

    #[test]
    fn test_render_literal_single_cell_rows() {
        let table = Table::single_column([Cell::from(1), Cell::from(2)]);
        assert_eq!(render_literal(&table), "[(1,), (2,)]");
        assert_eq!(render_literal(&Table::empty()), "[]");
    }

    #[test]
    fn test_render_raw_rows() {
        let raw = RawResult::Rows(vec![
            vec![Cell::from(1), Cell::from("Ann")],
            vec![Cell::from(2), Cell::Null],
        ]);
        assert_eq!(render_raw(&raw), "Row 1: 1, Ann\nRow 2: 2, NULL");
    }

    #[test]
    fn test_render_raw_records_and_values() {
        let records = RawResult::Records(vec![vec![
            ("Id".into(), Cell::from(1)),
            ("Name".into(), Cell::from("Ann")),
        ]]);
        assert_eq!(render_raw(&records), "Row 1: Id: 1, Name: Ann");

        let values = RawResult::Values(vec![Cell::from("a"), Cell::from(true)]);
        assert_eq!(render_raw(&values), "a\ntrue");
    }

    #[test]
    fn test_render_raw_empty() {
        assert_eq!(render_raw(&RawResult::Rows(Vec::new())), EMPTY_RESULT_TEXT);
        assert_eq!(render_raw(&RawResult::from("")), EMPTY_RESULT_TEXT);
        assert_eq!(render_raw(&RawResult::from("(1, 2)")), "(1, 2)");
    }
}
