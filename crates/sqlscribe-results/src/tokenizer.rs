//! Lenient row recovery for serialized lists the literal grammar rejects.
//!
//! Tuples are found by counting parentheses, split on top-level commas, and
//! each field is normalized on its own. Values the grammar does not model,
//! such as `datetime.datetime(...)`, pass through as labeled text.

use std::sync::LazyLock;

use regex::Regex;
use sqlscribe_core::Cell;

use crate::cells::{is_numeric, strip_quotes};
use crate::literal::format_date;

static DECIMAL_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Decimal\('([^']+)'\)").unwrap());
static DECIMAL_DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Decimal\("([^"]+)"\)"#).unwrap());
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"datetime\.date\((\d+),\s*(\d+),\s*(\d+)\)").unwrap());
static DATETIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"datetime\.datetime\(([^)]+)\)").unwrap());

/// Rows recovered from `text`, or `None` when it holds no complete tuple.
pub fn tokenize(text: &str) -> Option<Vec<Vec<Cell>>> {
    let content = text.trim().trim_start_matches('[').trim_end_matches(']');
    let tuples = extract_tuples(content);
    if tuples.is_empty() {
        return None;
    }
    Some(
        tuples
            .into_iter()
            .map(|tuple| split_fields(tuple).into_iter().map(normalize_value).collect())
            .collect(),
    )
}

/// Interiors of the top-level parenthesized groups, ignoring parentheses in quotes.
fn extract_tuples(content: &str) -> Vec<&str> {
    let mut tuples = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            (None, ')') if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    tuples.push(&content[start..i]);
                }
            }
            _ => {}
        }
    }
    tuples
}

/// Split on commas outside quotes and nested parentheses.
fn split_fields(tuple: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in tuple.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                fields.push(tuple[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = tuple[start..].trim();
    if !last.is_empty() {
        fields.push(last);
    }
    fields
}

fn normalize_value(value: &str) -> Cell {
    let value = value.trim();

    if value == "None" {
        return Cell::Null;
    }

    if value.contains("Decimal(") {
        let inner = [&*DECIMAL_SINGLE, &*DECIMAL_DOUBLE]
            .into_iter()
            .find_map(|re| re.captures(value));
        if let Some(caps) = inner {
            return Cell::number(&caps[1]);
        }
    }

    if let Some(caps) = DATE.captures(value) {
        return Cell::text(format_date(&caps[1], &caps[2], &caps[3]));
    }

    if let Some(caps) = DATETIME.captures(value) {
        return Cell::text(format!("datetime({})", &caps[1]));
    }

    match value {
        "True" => Cell::Bool(true),
        "False" => Cell::Bool(false),
        _ if is_numeric(value) => Cell::number(value),
        _ => Cell::text(strip_quotes(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_datetime_passthrough() {
        let rows =
            tokenize("[(1, datetime.datetime(2024, 1, 5, 10, 30), 'Ann'), (2, None, 'Bob')]")
                .unwrap();
        assert_eq!(
            rows,
            vec![
                vec![
                    Cell::number("1"),
                    Cell::text("datetime(2024, 1, 5, 10, 30)"),
                    Cell::text("Ann"),
                ],
                vec![Cell::number("2"), Cell::Null, Cell::text("Bob")],
            ]
        );
    }

    #[test]
    fn test_constructors() {
        let rows = tokenize(r#"[(Decimal("9.99"), datetime.date(2023, 7, 1), Decimal('1.5'))]"#)
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![
                Cell::number("9.99"),
                Cell::text("2023-07-01"),
                Cell::number("1.5"),
            ]]
        );
    }

    #[test]
    fn test_parentheses_inside_quotes() {
        let rows = tokenize("[('a (b', 'c)'), ('d', 'e')]").unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Cell::text("a (b"), Cell::text("c)")],
                vec![Cell::text("d"), Cell::text("e")],
            ]
        );
    }

    #[test]
    fn test_no_tuples() {
        assert_eq!(tokenize("[1, 2, 3]"), None);
        assert_eq!(tokenize("[(1, 2"), None);
    }
}
