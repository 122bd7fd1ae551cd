//! Scalar recognition shared by the text formats.

use std::sync::LazyLock;

use regex::Regex;
use sqlscribe_core::Cell;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap()
});

/// Whether `text` is a plain decimal or scientific number.
pub fn is_numeric(text: &str) -> bool {
    NUMBER.is_match(text)
}

/// Remove one layer of matching single or double quotes.
pub fn strip_quotes(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Type an unquoted field: `None`/`NULL` and empty fields are null,
/// `True`/`False` booleans, numeric text a number, anything else text.
pub fn typed_cell(field: &str) -> Cell {
    let field = field.trim();
    match field {
        "" | "None" | "NULL" | "null" => Cell::Null,
        "True" | "true" => Cell::Bool(true),
        "False" | "false" => Cell::Bool(false),
        _ if is_numeric(field) => Cell::number(field),
        _ => Cell::text(strip_quotes(field)),
    }
}
