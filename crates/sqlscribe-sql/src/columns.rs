//! Display column names for a statement.
//!
//! The names are a hint for result parsing. `SELECT *` expands through the
//! registry, and any name the registry knows is returned in canonical casing.
//! Statements the parser rejects fall back to a lexical split of the SELECT
//! list.

use std::sync::Arc;

use sqlscribe_core::SchemaRegistry;

use crate::analyzer::{last_segment, unquote, ProjectionItem, SelectShape, SqlAnalyzer};

/// Clause keywords that end a FROM table name in the lexical fallback.
const FROM_TERMINATORS: &[&str] = &[
    "INNER JOIN", "RIGHT JOIN", "LEFT JOIN", "GROUP BY", "ORDER BY", "HAVING", "WHERE", "LIMIT",
    "JOIN",
];

/// Infers display column names from SQL.
#[derive(Debug, Clone)]
pub struct ColumnInference {
    registry: Arc<SchemaRegistry>,
    analyzer: SqlAnalyzer,
}

impl ColumnInference {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            analyzer: SqlAnalyzer::new(),
        }
    }

    /// Column names for `sql`, empty when none can be derived.
    pub fn infer_columns(&self, sql: &str) -> Vec<String> {
        match self.analyzer.analyze_select(sql) {
            Ok(shape) => self.from_shape(&shape),
            Err(e) => {
                tracing::debug!(error = %e, "falling back to lexical column split");
                self.lexical(sql)
            }
        }
    }

    fn from_shape(&self, shape: &SelectShape) -> Vec<String> {
        let mut columns = Vec::new();
        for item in &shape.projection {
            match item {
                ProjectionItem::Named(name) => columns.push(self.canonical(name)),
                ProjectionItem::Wildcard => {
                    for table in &shape.tables {
                        columns.extend(self.table_columns(&table.name));
                    }
                }
                ProjectionItem::QualifiedWildcard(qualifier) => {
                    let name = shape
                        .resolve(qualifier)
                        .map_or(qualifier.as_str(), |t| t.name.as_str());
                    columns.extend(self.table_columns(name));
                }
            }
        }
        columns
    }

    fn lexical(&self, sql: &str) -> Vec<String> {
        let upper = sql.to_ascii_uppercase();
        let Some(select_pos) = upper.find("SELECT") else {
            return Vec::new();
        };
        let list_start = select_pos + "SELECT".len();
        let from_pos = upper[list_start..].find("FROM").map(|p| p + list_start);

        let mut select_list = sql[list_start..from_pos.unwrap_or(sql.len())].trim();
        if select_list
            .get(..9)
            .is_some_and(|head| head.eq_ignore_ascii_case("DISTINCT "))
        {
            select_list = select_list[9..].trim_start();
        }

        if select_list == "*" {
            let table = from_pos
                .map(|p| first_table(&sql[p + "FROM".len()..]))
                .unwrap_or_default();
            return self.table_columns(table);
        }

        let mut columns = Vec::new();
        for part in split_select_list(select_list) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some(alias) = alias_of(part) {
                columns.push(self.canonical(unquote(alias)));
            } else if let Some(qualifier) = part.strip_suffix(".*") {
                columns.extend(self.table_columns(unquote(last_segment(qualifier))));
            } else {
                columns.push(self.canonical(unquote(last_segment(part))));
            }
        }
        columns
    }

    fn canonical(&self, name: &str) -> String {
        self.registry
            .canonical_column(name)
            .unwrap_or(name)
            .to_string()
    }

    fn table_columns(&self, table: &str) -> Vec<String> {
        self.registry
            .columns(table)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }
}

/// Text after the last ` AS `, ignoring case.
fn alias_of(part: &str) -> Option<&str> {
    let upper = part.to_ascii_uppercase();
    upper
        .rfind(" AS ")
        .map(|pos| part[pos + 4..].trim())
        .filter(|alias| !alias.is_empty())
}

/// First table name in a FROM clause.
fn first_table(from_clause: &str) -> &str {
    let upper = from_clause.to_ascii_uppercase();
    let end = FROM_TERMINATORS
        .iter()
        .filter_map(|kw| upper.find(kw))
        .min()
        .unwrap_or(from_clause.len());
    let table = from_clause[..end]
        .split_whitespace()
        .next()
        .unwrap_or_default();
    unquote(table.trim_end_matches([',', ';']))
}

/// Split a SELECT list on commas outside parentheses and single quotes.
fn split_select_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}
