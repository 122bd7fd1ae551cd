//! Terminal output for tables and reports.

use anyhow::Result;
use serde::Serialize;
use sqlscribe_core::Table;
use sqlscribe_results::EMPTY_RESULT_TEXT;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a table as aligned `|`-separated text with a row count footer.
pub fn render_table(table: &Table) -> String {
    if table.is_empty() && table.columns.is_empty() {
        return EMPTY_RESULT_TEXT.to_string();
    }

    let width = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.columns.len()))
        .max()
        .unwrap_or_default();

    let header: Vec<String> = (0..width)
        .map(|i| table.columns.get(i).cloned().unwrap_or_default())
        .collect();
    let rows: Vec<Vec<String>> = (0..table.row_count())
        .map(|r| {
            (0..width)
                .map(|i| table.get(r, i).map(ToString::to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 3);
    lines.push(format_line(&header, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        lines.push(format_line(row, &widths));
    }
    let count = table.row_count();
    lines.push(format!("({count} row{})", if count == 1 { "" } else { "s" }));
    lines.join("\n")
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let pad = width - value.chars().count();
            format!("{value}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
