//! `sqlscribe check` command implementation.
//!
//! Validates the configuration before it is used by the pipeline:
//! - the schema builds a registry (no duplicate tables or columns)
//! - every table has columns
//! - names that differ only by case, which normalization leaves alone
//! - blank entries in the heuristic phrase lists

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use sqlscribe_core::{SchemaRegistry, SqlscribeConfig};

use crate::output::print_json;

/// Severity level for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single check finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFinding {
    pub severity: Severity,
    pub category: &'static str,
    pub message: String,
    /// Configuration path of the offending entry, e.g. `schema.tables.Customer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CheckFinding {
    fn error(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
            location: None,
        }
    }

    fn warning(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
            location: None,
        }
    }

    fn info(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            category,
            message: message.into(),
            location: None,
        }
    }

    fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Results from running all checks.
#[derive(Debug, Default, Serialize)]
pub struct CheckResults {
    pub tables: usize,
    pub columns: usize,
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Print human-readable summary.
    pub fn print_summary(&self) {
        let mut findings: Vec<_> = self.findings.iter().collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.category.cmp(b.category)));

        println!("  Schema: {} table(s), {} column(s)", self.tables, self.columns);
        if !findings.is_empty() {
            println!();
            println!("{}", "─".repeat(60));
            for finding in findings {
                print_finding(finding);
            }
        }

        println!();
        println!("{}", "═".repeat(60));
        if self.error_count() == 0 && self.warning_count() == 0 {
            println!("✅ All checks passed!");
        } else {
            println!(
                "Summary: {} error(s), {} warning(s)",
                self.error_count(),
                self.warning_count()
            );
        }
    }
}

fn print_finding(finding: &CheckFinding) {
    let location = finding
        .location
        .as_deref()
        .map(|l| format!(" [{l}]"))
        .unwrap_or_default();
    println!(
        "  {:<5} [{}]{}: {}",
        finding.severity, finding.category, location, finding.message
    );
}

/// Run every check against a loaded configuration.
pub fn check_config(config: &SqlscribeConfig) -> CheckResults {
    let mut results = CheckResults::default();

    match SchemaRegistry::from_config(&config.schema) {
        Ok(registry) => {
            results.tables = registry.table_count();
            results.columns = registry.column_count();
            results.findings.extend(check_schema(&registry));
        }
        Err(err) => {
            results
                .findings
                .push(CheckFinding::error("schema", err.to_string()).with_location("schema.tables"));
        }
    }

    results.findings.extend(check_phrases(config));
    results
}

fn check_schema(registry: &SchemaRegistry) -> Vec<CheckFinding> {
    let mut findings = Vec::new();

    if registry.is_empty() {
        findings.push(CheckFinding::warning(
            "schema",
            "no tables configured; identifiers will not be normalized and SELECT * cannot be expanded",
        ));
        return findings;
    }

    for table in registry.tables() {
        let location = format!("schema.tables.{}", table.name());
        if table.columns().is_empty() {
            findings.push(
                CheckFinding::warning("schema", format!("table {} has no columns", table.name()))
                    .with_location(location.clone()),
            );
        }
        if !registry.is_unambiguous_table(table.name()) {
            findings.push(
                CheckFinding::warning(
                    "casing",
                    format!(
                        "table {} differs from another table only by case and will not be normalized",
                        table.name()
                    ),
                )
                .with_location(location),
            );
        }
    }

    let ambiguous: BTreeSet<&str> = registry
        .qualified_columns()
        .filter(|(_, column)| !registry.is_unambiguous_column(column))
        .map(|(_, column)| column)
        .collect();
    for column in ambiguous {
        findings.push(CheckFinding::info(
            "casing",
            format!("column {column} is spelled differently across tables; only Table.{column} references are normalized"),
        ));
    }

    findings
}

fn check_phrases(config: &SqlscribeConfig) -> Vec<CheckFinding> {
    let lists = [
        ("extraction.extra_prefixes", &config.extraction.extra_prefixes),
        (
            "extraction.extra_closing_phrases",
            &config.extraction.extra_closing_phrases,
        ),
        ("results.extra_empty_markers", &config.results.extra_empty_markers),
    ];

    lists
        .into_iter()
        .flat_map(|(location, phrases)| {
            phrases
                .iter()
                .enumerate()
                .filter(|(_, phrase)| phrase.trim().is_empty())
                .map(move |(i, _)| {
                    CheckFinding::warning("heuristics", "blank phrase is ignored")
                        .with_location(format!("{location}[{i}]"))
                })
        })
        .collect()
}

/// `sqlscribe check`
pub fn run_check(config_path: &Path, config: &SqlscribeConfig, json: bool) -> Result<()> {
    let results = check_config(config);

    if json {
        print_json(&results)?;
    } else {
        println!("🔍 Checking sqlscribe configuration ({})...", config_path.display());
        if let Some(project) = &config.project {
            println!("  Project: {project}");
        }
        results.print_summary();
    }

    if results.has_errors() {
        anyhow::bail!(
            "Configuration check failed with {} error(s)",
            results.error_count()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(yaml: &str) -> SqlscribeConfig {
        SqlscribeConfig::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_clean_config() {
        let results = check_config(&config(
            "schema:\n  tables:\n    Customer: [CustomerID, FirstName]\n    SalesOrder: [SalesOrderID, CustomerID]\n",
        ));
        assert_eq!(results.tables, 2);
        assert_eq!(results.columns, 4);
        assert!(results.findings.is_empty());
    }

    #[test]
    fn test_duplicate_column_is_an_error() {
        let results = check_config(&config(
            "schema:\n  tables:\n    Customer: [CustomerID, CustomerID]\n",
        ));
        assert!(results.has_errors());
        assert_eq!(results.findings[0].location.as_deref(), Some("schema.tables"));
    }

    #[test]
    fn test_empty_schema_warns() {
        let results = check_config(&config("project: empty"));
        assert_eq!(results.warning_count(), 1);
        assert!(!results.has_errors());
    }

    #[test]
    fn test_table_without_columns() {
        let results = check_config(&config("schema:\n  tables:\n    Audit: []\n"));
        assert_eq!(
            results.findings,
            vec![
                CheckFinding::warning("schema", "table Audit has no columns")
                    .with_location("schema.tables.Audit")
            ]
        );
    }

    #[test]
    fn test_column_casing_conflict() {
        let results = check_config(&config(
            "schema:\n  tables:\n    A: [OrderDate]\n    B: [orderdate]\n",
        ));
        let infos: Vec<_> = results
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Info)
            .collect();
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().all(|f| f.category == "casing"));
    }

    #[test]
    fn test_blank_phrases() {
        let results = check_config(&config(
            "schema:\n  tables:\n    T: [Id]\nextraction:\n  extra_prefixes: [\"Answer:\", \" \"]\n",
        ));
        assert_eq!(
            results.findings,
            vec![
                CheckFinding::warning("heuristics", "blank phrase is ignored")
                    .with_location("extraction.extra_prefixes[1]")
            ]
        );
    }
}
