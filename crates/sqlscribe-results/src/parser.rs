//! Raw result → [`Table`].
//!
//! Structured shapes map directly. Text runs through an ordered list of
//! [`TextFormat`]s; the first one that recognizes the text decides the
//! result. A recognized format that then fails degrades to a single-cell
//! table holding the input.

use sqlscribe_core::{Cell, Diagnostic, ResultsConfig, Table};

use crate::cells::{strip_quotes, typed_cell};
use crate::literal::{self, Literal};
use crate::naming::name_rows;
use crate::raw::RawResult;
use crate::tokenizer;

/// Text that marks a result with no rows.
pub const DEFAULT_EMPTY_MARKERS: &[&str] = &["查询结果为空", "No results"];

/// What a text format recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRows {
    /// The text stands for zero rows.
    Empty,
    /// Positional rows to be named by the column policy.
    Rows(Vec<Vec<Cell>>),
    /// Rows under a header row found in the text.
    Headed {
        header: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
    /// Values for the single `result` column.
    Lines(Vec<Cell>),
    /// The format matched but could not be parsed.
    Unparsed(String),
}

/// One named way of reading result text.
pub trait TextFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when `text` is not in this format.
    fn parse(&self, text: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<TextRows>;
}

/// Result of one parse with the format that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub table: Table,
    /// `rows`, `records`, `values`, or the name of the text format.
    pub format: &'static str,
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns any [`RawResult`] into a [`Table`]. Never fails.
pub struct ResultParser {
    formats: Vec<Box<dyn TextFormat>>,
}

impl Default for ResultParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResultParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultParser")
            .field("formats", &self.format_names())
            .finish()
    }
}

impl ResultParser {
    /// Create a parser with the built-in empty markers.
    pub fn new() -> Self {
        Self::from_config(&ResultsConfig::default())
    }

    /// Create a parser whose empty markers are extended by configuration.
    pub fn from_config(config: &ResultsConfig) -> Self {
        let markers = DEFAULT_EMPTY_MARKERS
            .iter()
            .map(|m| m.to_string())
            .chain(
                config
                    .extra_empty_markers
                    .iter()
                    .filter(|m| !m.trim().is_empty())
                    .map(|m| m.trim().to_string()),
            )
            .collect();

        Self::with_formats(vec![
            Box::new(EmptyMarker::new(markers)),
            Box::new(BracketedLiteral),
            Box::new(ParenthesizedRows),
            Box::new(CommaSeparated),
            Box::new(DelimiterTable),
            Box::new(PlainLines),
        ])
    }

    /// Create a parser from an explicit text format list.
    pub fn with_formats(formats: Vec<Box<dyn TextFormat>>) -> Self {
        Self { formats }
    }

    /// Names of the configured text formats, in order.
    pub fn format_names(&self) -> Vec<&'static str> {
        self.formats.iter().map(|f| f.name()).collect()
    }

    /// Parse `raw`, naming columns from `hint` when it fits.
    pub fn parse(&self, raw: impl Into<RawResult>, hint: &[String]) -> Table {
        self.parse_with_outcome(raw, hint).table
    }

    pub fn parse_with_outcome(&self, raw: impl Into<RawResult>, hint: &[String]) -> ParseOutcome {
        let mut diagnostics = Vec::new();
        let (table, format) = match raw.into() {
            RawResult::Rows(rows) => (name_rows(rows, hint, &mut diagnostics), "rows"),
            RawResult::Records(records) => (records_table(records), "records"),
            RawResult::Values(values) if values.is_empty() => (Table::empty(), "values"),
            RawResult::Values(values) => (Table::single_column(values), "values"),
            RawResult::Text(text) => self.parse_text(&text, hint, &mut diagnostics),
        };

        ParseOutcome {
            table,
            format,
            diagnostics,
        }
    }

    fn parse_text(
        &self,
        text: &str,
        hint: &[String],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Table, &'static str) {
        let trimmed = text.trim();

        for format in &self.formats {
            let Some(parsed) = format.parse(trimmed, diagnostics) else {
                continue;
            };
            tracing::debug!(format = format.name(), "recognized result text");

            let table = match parsed {
                TextRows::Empty => Table::empty(),
                TextRows::Rows(rows) => name_rows(rows, hint, diagnostics),
                TextRows::Headed { header, rows } => {
                    if !hint.is_empty() && rows.iter().all(|r| r.len() == hint.len()) {
                        Table::new(hint.to_vec(), rows)
                    } else {
                        name_rows(rows, &header, diagnostics)
                    }
                }
                TextRows::Lines(values) => Table::single_column(values),
                TextRows::Unparsed(reason) => total_failure(trimmed, reason, diagnostics),
            };
            return (table, format.name());
        }

        (
            total_failure(trimmed, "no format recognized the text".to_string(), diagnostics),
            "fallback",
        )
    }
}

fn total_failure(text: &str, reason: String, diagnostics: &mut Vec<Diagnostic>) -> Table {
    tracing::warn!(%reason, "falling back to a single-cell result");
    diagnostics.push(Diagnostic::TotalFailure { reason });
    Table::fallback(text)
}

/// Columns come from the first record; fields missing from later records are null.
fn records_table(records: Vec<Vec<(String, Cell)>>) -> Table {
    let Some(first) = records.first() else {
        return Table::empty();
    };
    let columns: Vec<String> = first.iter().map(|(name, _)| name.clone()).collect();
    let rows = records
        .into_iter()
        .map(|mut record| {
            columns
                .iter()
                .map(|column| {
                    record
                        .iter()
                        .position(|(name, _)| name == column)
                        .map(|i| record.swap_remove(i).1)
                        .unwrap_or(Cell::Null)
                })
                .collect()
        })
        .collect();
    Table::new(columns, rows)
}

/// Empty text, or text containing a "no rows" marker anywhere.
#[derive(Debug, Clone)]
pub struct EmptyMarker {
    markers: Vec<String>,
}

impl EmptyMarker {
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }
}

impl TextFormat for EmptyMarker {
    fn name(&self) -> &'static str {
        "empty_marker"
    }

    fn parse(&self, text: &str, _diagnostics: &mut Vec<Diagnostic>) -> Option<TextRows> {
        (text.is_empty() || self.markers.iter().any(|m| text.contains(m.as_str())))
            .then_some(TextRows::Empty)
    }
}

/// `[ ... ]` serialized rows: the literal grammar, then the manual tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketedLiteral;

impl TextFormat for BracketedLiteral {
    fn name(&self) -> &'static str {
        "bracketed_literal"
    }

    fn parse(&self, text: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<TextRows> {
        if !(text.starts_with('[') && text.ends_with(']')) {
            return None;
        }

        match literal::parse(text) {
            Ok(value) => Some(literal_rows(&value)),
            Err(e) => {
                tracing::warn!(
                    offset = e.offset,
                    reason = %e.reason,
                    "literal grammar rejected result, tokenizing"
                );
                diagnostics.push(Diagnostic::LiteralParseFailure {
                    offset: e.offset,
                    reason: e.reason,
                });
                Some(match tokenizer::tokenize(text) {
                    Some(rows) => TextRows::Rows(rows),
                    None => TextRows::Unparsed("no tuple found in bracketed text".to_string()),
                })
            }
        }
    }
}

/// A list of sequences is one row per sequence; a list of scalars is one row.
fn literal_rows(value: &Literal) -> TextRows {
    let items = value.items().unwrap_or_default();
    if items.is_empty() {
        return TextRows::Empty;
    }

    if items.iter().any(|item| item.items().is_some()) {
        TextRows::Rows(
            items
                .iter()
                .map(|item| match item.items() {
                    Some(cells) => cells.iter().map(Literal::to_cell).collect(),
                    None => vec![item.to_cell()],
                })
                .collect(),
        )
    } else {
        TextRows::Rows(vec![items.iter().map(Literal::to_cell).collect()])
    }
}

fn content_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

fn naive_split(line: &str) -> Vec<Cell> {
    line.split(',')
        .map(|v| Cell::text(strip_quotes(v.trim())))
        .collect()
}

/// One `(v1, v2, ...)` tuple per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParenthesizedRows;

impl TextFormat for ParenthesizedRows {
    fn name(&self) -> &'static str {
        "parenthesized_rows"
    }

    fn parse(&self, text: &str, _diagnostics: &mut Vec<Diagnostic>) -> Option<TextRows> {
        let lines = content_lines(text);
        let first = lines.first()?;
        if !(first.starts_with('(') && first.ends_with(')')) {
            return None;
        }
        Some(TextRows::Rows(
            lines
                .into_iter()
                .map(|line| {
                    let inner = line.strip_prefix('(').unwrap_or(line);
                    naive_split(inner.strip_suffix(')').unwrap_or(inner))
                })
                .collect(),
        ))
    }
}

/// Comma-separated values, one row per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommaSeparated;

impl TextFormat for CommaSeparated {
    fn name(&self) -> &'static str {
        "comma_separated"
    }

    fn parse(&self, text: &str, _diagnostics: &mut Vec<Diagnostic>) -> Option<TextRows> {
        let lines = content_lines(text);
        if !lines.first()?.contains(',') {
            return None;
        }
        Some(TextRows::Rows(lines.iter().map(|l| naive_split(l)).collect()))
    }
}

/// `|`- or tab-delimited tables, including markdown tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterTable;

impl DelimiterTable {
    fn is_separator_row(line: &str) -> bool {
        line.contains('-') && line.chars().all(|c| matches!(c, '-' | ':' | '|' | '+' | ' '))
    }
}

impl TextFormat for DelimiterTable {
    fn name(&self) -> &'static str {
        "delimiter_table"
    }

    fn parse(&self, text: &str, _diagnostics: &mut Vec<Diagnostic>) -> Option<TextRows> {
        let delimiter = if text.contains('|') {
            b'|'
        } else if text.contains('\t') {
            b'\t'
        } else {
            return None;
        };

        let lines = content_lines(text);
        let has_header = lines.get(1).is_some_and(|l| Self::is_separator_row(l));
        let normalized = lines
            .iter()
            .filter(|l| !Self::is_separator_row(l))
            .map(|l| {
                if delimiter == b'|' {
                    l.trim_start_matches('|').trim_end_matches('|')
                } else {
                    *l
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(normalized.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            match record {
                Ok(record) => rows.push(record.iter().map(typed_cell).collect::<Vec<_>>()),
                Err(e) => return Some(TextRows::Unparsed(e.to_string())),
            }
        }

        if has_header && !rows.is_empty() {
            let header = rows.remove(0).iter().map(ToString::to_string).collect();
            return Some(TextRows::Headed { header, rows });
        }
        Some(TextRows::Rows(rows))
    }
}

/// Any other text: one `result` row per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLines;

impl TextFormat for PlainLines {
    fn name(&self) -> &'static str {
        "plain_lines"
    }

    fn parse(&self, text: &str, _diagnostics: &mut Vec<Diagnostic>) -> Option<TextRows> {
        let lines = content_lines(text);
        if lines.is_empty() {
            return Some(TextRows::Empty);
        }
        Some(TextRows::Lines(lines.into_iter().map(Cell::text).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlscribe_core::RESULT_COLUMN;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_format_order() {
        assert_eq!(
            ResultParser::new().format_names(),
            vec![
                "empty_marker",
                "bracketed_literal",
                "parenthesized_rows",
                "comma_separated",
                "delimiter_table",
                "plain_lines",
            ]
        );
    }

    #[test]
    fn test_decimal_rows() {
        let table = ResultParser::new().parse(
            "[('A', Decimal('12.50')), ('B', Decimal('3.00'))]",
            &names(&["Name", "Price"]),
        );
        assert_eq!(table.columns, names(&["Name", "Price"]));
        assert_eq!(
            table.column_values(1).cloned().collect::<Vec<_>>(),
            vec![Cell::number("12.50"), Cell::number("3.00")]
        );
    }

    #[test]
    fn test_empty_inputs() {
        let parser = ResultParser::new();
        for raw in ["", "   ", "查询结果为空", "No results.", "Query returned: 查询结果为空", "[]"] {
            let outcome = parser.parse_with_outcome(raw, &[]);
            assert_eq!(outcome.table, Table::empty(), "input: {raw:?}");
            assert!(outcome.diagnostics.is_empty());
        }
    }

    #[test]
    fn test_configured_empty_marker() {
        let parser = ResultParser::from_config(&ResultsConfig {
            extra_empty_markers: vec!["(0 rows)".to_string()],
        });
        assert!(parser.parse("(0 rows)", &[]).is_empty());
        // Without the marker the same text is a parenthesized row.
        assert_eq!(ResultParser::new().parse("(0 rows)", &[]).row_count(), 1);
    }

    #[test]
    fn test_grammar_failure_uses_tokenizer() {
        let outcome = ResultParser::new().parse_with_outcome(
            "[(1, datetime.datetime(2024, 1, 5, 10, 30))]",
            &names(&["Id", "At"]),
        );
        assert_eq!(outcome.format, "bracketed_literal");
        assert_eq!(outcome.table.columns, names(&["Id", "At"]));
        assert_eq!(
            outcome.table.rows,
            vec![vec![
                Cell::number("1"),
                Cell::text("datetime(2024, 1, 5, 10, 30)")
            ]]
        );
        assert!(matches!(
            outcome.diagnostics.as_slice(),
            [Diagnostic::LiteralParseFailure { .. }]
        ));
    }

    #[test]
    fn test_total_failure() {
        let outcome = ResultParser::new().parse_with_outcome("[not a list]", &[]);
        assert_eq!(outcome.table, Table::fallback("[not a list]"));
        assert!(outcome.diagnostics.iter().any(Diagnostic::is_warning));
    }

    #[test]
    fn test_list_of_scalars_is_one_row() {
        let table = ResultParser::new().parse("[1, 'a', None]", &[]);
        assert_eq!(table.columns, names(&["Column_1", "Column_2", "Column_3"]));
        assert_eq!(
            table.rows,
            vec![vec![Cell::number("1"), Cell::text("a"), Cell::Null]]
        );
    }

    #[test]
    fn test_nested_sequence_kept_as_text() {
        let table = ResultParser::new().parse("[(1, (2, 3))]", &[]);
        assert_eq!(table.rows[0][1], Cell::text("(2, 3)"));
    }

    #[test]
    fn test_parenthesized_lines() {
        let table = ResultParser::new().parse("(1, 'Ann')\n(2, 'Bob')", &names(&["Id", "Name"]));
        assert_eq!(table.columns, names(&["Id", "Name"]));
        assert_eq!(table.rows[1], vec![Cell::text("2"), Cell::text("Bob")]);
    }

    #[test]
    fn test_comma_separated_lines() {
        let table = ResultParser::new().parse("Ann, 30\nBob, 41\n", &[]);
        assert_eq!(table.columns, names(&["Column_1", "Column_2"]));
        assert_eq!(table.rows[0], vec![Cell::text("Ann"), Cell::text("30")]);
    }

    #[test]
    fn test_markdown_table_header() {
        let text = "| Name | Total |\n|------|------:|\n| Ann  | 12.5  |\n| Bob  |       |";
        let table = ResultParser::new().parse(text, &[]);
        assert_eq!(table.columns, names(&["Name", "Total"]));
        assert_eq!(
            table.rows,
            vec![
                vec![Cell::text("Ann"), Cell::number("12.5")],
                vec![Cell::text("Bob"), Cell::Null],
            ]
        );
    }

    #[test]
    fn test_tab_table_uses_hint() {
        let table = ResultParser::new().parse("1\tAnn\n2\tBob", &names(&["Id", "Name"]));
        assert_eq!(table.columns, names(&["Id", "Name"]));
        assert_eq!(table.rows[0], vec![Cell::number("1"), Cell::text("Ann")]);
    }

    #[test]
    fn test_plain_lines() {
        let table = ResultParser::new().parse("Ann\nBob", &names(&["Name"]));
        assert_eq!(table.columns, vec![RESULT_COLUMN]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_structured_rows_width_mismatch() {
        let outcome = ResultParser::new().parse_with_outcome(
            vec![vec![Cell::from(1), Cell::from("a")]],
            &names(&["a", "b", "c"]),
        );
        assert_eq!(outcome.table.columns, names(&["Column_1", "Column_2"]));
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::RowWidthMismatch {
                expected: 3,
                found: 2
            }]
        );
    }

    #[test]
    fn test_records_fill_missing_fields() {
        let raw = RawResult::Records(vec![
            vec![("Id".into(), Cell::from(1)), ("Name".into(), Cell::from("Ann"))],
            vec![("Name".into(), Cell::from("Bob"))],
        ]);
        let table = ResultParser::new().parse(raw, &[]);
        assert_eq!(table.columns, names(&["Id", "Name"]));
        assert_eq!(table.rows[1], vec![Cell::Null, Cell::text("Bob")]);
    }

    #[test]
    fn test_values_single_column() {
        let table = ResultParser::new().parse(vec![Cell::from(7), Cell::from(8)], &[]);
        assert_eq!(table.columns, vec![RESULT_COLUMN]);
        assert_eq!(table.rows, vec![vec![Cell::number("7")], vec![Cell::number("8")]]);
    }
}
