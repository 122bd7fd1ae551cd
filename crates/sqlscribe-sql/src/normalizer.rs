//! Identifier casing correction.
//!
//! Models often lowercase identifiers (`select firstname from customer`) while
//! the database is case-sensitive (`Customer.FirstName`). [`CaseNormalizer`]
//! rewrites the casing of known tables and columns with word-bounded,
//! case-insensitive patterns compiled once from the registry.
//!
//! Tables are corrected before columns because the qualified column patterns
//! anchor on canonical table names.
//!
//! The rewrite is lexical. It does not know about string literals or aliases,
//! so a bare column name inside a quoted value is rewritten too.

use std::collections::HashSet;
use std::sync::Arc;

use regex::{NoExpand, Regex};
use serde::Serialize;
use sqlscribe_core::{Diagnostic, SchemaRegistry};

use crate::keywords;

/// Patterns for one table.
#[derive(Debug)]
struct TableRule {
    canonical: String,
    /// `FROM|JOIN|UPDATE|INTO <table>`
    after_keyword: Regex,
    /// `<table>.<word>`
    qualifier: Regex,
    /// bare `<table>` anywhere, for reporting
    word: Regex,
}

/// `<table>.<column>` pattern for one column of one table.
#[derive(Debug)]
struct QualifiedRule {
    replacement: String,
    pattern: Regex,
}

/// Patterns for one column spelling shared by every table that has it.
#[derive(Debug)]
struct ColumnRule {
    canonical: String,
    reserved: bool,
    word: Regex,
    /// The column after a SELECT/WHERE/ORDER BY/GROUP BY keyword.
    context: Regex,
}

/// Result of one normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationOutcome {
    pub sql: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Advisory summary of what a normalization changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionReport {
    /// Entries like `customer -> Customer`.
    pub table_corrections: Vec<String>,
    /// Entries like `firstname -> FirstName`.
    pub column_corrections: Vec<String>,
    pub no_changes: bool,
}

/// Rewrites identifier casing to match a [`SchemaRegistry`].
#[derive(Debug, Clone)]
pub struct CaseNormalizer {
    rules: Arc<Rules>,
}

#[derive(Debug, Default)]
struct Rules {
    tables: Vec<TableRule>,
    qualified: Vec<QualifiedRule>,
    columns: Vec<ColumnRule>,
}

impl CaseNormalizer {
    /// Compile casing rules for every unambiguous table and column.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        let rules = Rules::compile(&registry);
        tracing::debug!(
            tables = rules.tables.len(),
            qualified = rules.qualified.len(),
            columns = rules.columns.len(),
            "compiled casing rules"
        );
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Correct table then column casing. Returns the input unchanged when
    /// nothing matches.
    pub fn normalize(&self, sql: &str) -> String {
        self.normalize_with_outcome(sql).sql
    }

    pub fn normalize_with_outcome(&self, sql: &str) -> NormalizationOutcome {
        if sql.is_empty() {
            return NormalizationOutcome {
                sql: String::new(),
                diagnostics: vec![Diagnostic::NormalizationNoOp],
            };
        }

        let fixed = self.fix_table_names(sql);
        let fixed = self.fix_column_names(&fixed);

        let diagnostics = if fixed == sql {
            vec![Diagnostic::NormalizationNoOp]
        } else {
            tracing::debug!(before = sql, after = %fixed, "corrected identifier casing");
            Vec::new()
        };

        NormalizationOutcome {
            sql: fixed,
            diagnostics,
        }
    }

    /// Table-name pass.
    pub fn fix_table_names(&self, sql: &str) -> String {
        let mut fixed = sql.to_string();
        for rule in &self.rules.tables {
            fixed = rule
                .after_keyword
                .replace_all(&fixed, |caps: &regex::Captures| {
                    format!("{}{}{}", &caps[1], &caps[2], rule.canonical)
                })
                .into_owned();
            fixed = rule
                .qualifier
                .replace_all(&fixed, |caps: &regex::Captures| {
                    format!("{}.{}", rule.canonical, &caps[1])
                })
                .into_owned();
        }
        fixed
    }

    /// Column-name pass.
    pub fn fix_column_names(&self, sql: &str) -> String {
        let mut fixed = sql.to_string();

        for rule in &self.rules.qualified {
            fixed = rule
                .pattern
                .replace_all(&fixed, NoExpand(&rule.replacement))
                .into_owned();
        }

        for rule in self.rules.columns.iter().filter(|r| !r.reserved) {
            if rule.context.is_match(&fixed) {
                fixed = rule
                    .word
                    .replace_all(&fixed, NoExpand(&rule.canonical))
                    .into_owned();
            }
        }

        fixed
    }

    /// Compare identifier spellings before and after a correction.
    pub fn diff(&self, original: &str, corrected: &str) -> CorrectionReport {
        let mut report = CorrectionReport {
            no_changes: original == corrected,
            ..CorrectionReport::default()
        };
        if report.no_changes {
            return report;
        }

        let mut seen = HashSet::new();
        for rule in &self.rules.tables {
            collect_corrections(
                &rule.word,
                &rule.canonical,
                original,
                corrected,
                &mut seen,
                &mut report.table_corrections,
            );
        }
        for rule in &self.rules.columns {
            collect_corrections(
                &rule.word,
                &rule.canonical,
                original,
                corrected,
                &mut seen,
                &mut report.column_corrections,
            );
        }

        report
    }
}

fn collect_corrections(
    word: &Regex,
    canonical: &str,
    original: &str,
    corrected: &str,
    seen: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    if !word.find_iter(corrected).any(|m| m.as_str() == canonical) {
        return;
    }
    for m in word.find_iter(original) {
        if m.as_str() != canonical {
            let entry = format!("{} -> {}", m.as_str(), canonical);
            if seen.insert(entry.clone()) {
                out.push(entry);
            }
        }
    }
}

impl Rules {
    fn compile(registry: &SchemaRegistry) -> Self {
        let mut rules = Rules::default();

        for table in registry.tables() {
            if !registry.is_unambiguous_table(table.name()) {
                tracing::debug!(table = table.name(), "skipping table with ambiguous casing");
                continue;
            }
            let name = regex::escape(table.name());
            rules.tables.push(TableRule {
                canonical: table.name().to_string(),
                after_keyword: case_insensitive(&format!(r"\b(FROM|JOIN|UPDATE|INTO)(\s+){name}\b")),
                qualifier: case_insensitive(&format!(r"\b{name}\.(\w+)")),
                word: case_insensitive(&format!(r"\b{name}\b")),
            });

            for column in table.columns() {
                if column.to_lowercase() == *column {
                    continue;
                }
                let col = regex::escape(column);
                rules.qualified.push(QualifiedRule {
                    replacement: format!("{}.{}", table.name(), column),
                    pattern: case_insensitive(&format!(r"\b{name}\.{col}\b")),
                });
            }
        }

        let mut seen = HashSet::new();
        for (_, column) in registry.qualified_columns() {
            let Some(canonical) = registry.canonical_column(column) else {
                continue;
            };
            if !seen.insert(canonical.to_lowercase()) {
                continue;
            }
            let col = regex::escape(canonical);
            rules.columns.push(ColumnRule {
                canonical: canonical.to_string(),
                reserved: keywords::is_reserved(canonical),
                word: case_insensitive(&format!(r"\b{col}\b")),
                context: Regex::new(&format!(
                    r"(?is)\b(?:SELECT|WHERE|ORDER\s+BY|GROUP\s+BY)\b.*?\b{col}\b"
                ))
                .expect("escaped identifier pattern is valid"),
            });
        }

        rules
    }
}

fn case_insensitive(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("escaped identifier pattern is valid")
}
