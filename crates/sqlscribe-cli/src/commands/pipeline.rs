//! `sqlscribe extract | normalize | columns | parse-result | run`.
//!
//! Every command builds the same [`Pipeline`] from the configuration and
//! prints either plain text or a JSON report.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlscribe_core::{Diagnostic, SchemaRegistry, SqlscribeConfig, Table};
use sqlscribe_results::{ParseOutcome, RawResult, ResultParser};
use sqlscribe_sql::{CaseNormalizer, ColumnInference, CorrectionReport, SqlExtractor};

use crate::output::{print_json, render_table};

/// How a raw result file is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// JSON arrays as structured rows, anything else as text
    #[default]
    Auto,
    /// Always result text
    Text,
    /// Always JSON
    Json,
}

/// Turn the contents of a result file into a [`RawResult`].
pub fn raw_result(text: String, format: InputFormat) -> Result<RawResult> {
    match format {
        InputFormat::Text => Ok(RawResult::Text(text)),
        InputFormat::Json => {
            let value: JsonValue =
                serde_json::from_str(&text).context("Result is not valid JSON")?;
            Ok(RawResult::from_json(value))
        }
        InputFormat::Auto => match serde_json::from_str::<JsonValue>(&text) {
            Ok(value @ JsonValue::Array(_)) => Ok(RawResult::from_json(value)),
            _ => Ok(RawResult::Text(text)),
        },
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractReport {
    pub sql: String,
    pub applied: Vec<&'static str>,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NormalizeReport {
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrections: Option<CorrectionReport>,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub format: &'static str,
    pub table: Table,
    pub diagnostics: Vec<String>,
}

impl From<ParseOutcome> for ParseReport {
    fn from(outcome: ParseOutcome) -> Self {
        Self {
            format: outcome.format,
            table: outcome.table,
            diagnostics: messages(&outcome.diagnostics),
        }
    }
}

/// Everything `sqlscribe run` produces.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub sql: String,
    pub applied: Vec<&'static str>,
    pub corrections: CorrectionReport,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ParseReport>,
    pub diagnostics: Vec<String>,
}

/// The configured pipeline stages, sharing one schema registry.
#[derive(Debug)]
pub struct Pipeline {
    extractor: SqlExtractor,
    normalizer: CaseNormalizer,
    inference: ColumnInference,
    parser: ResultParser,
}

impl Pipeline {
    pub fn from_config(config: &SqlscribeConfig) -> Result<Self> {
        let registry = SchemaRegistry::from_config(&config.schema)
            .context("Invalid schema configuration")?;
        tracing::debug!(
            tables = registry.table_count(),
            columns = registry.column_count(),
            "schema registry ready"
        );
        let registry = Arc::new(registry);

        Ok(Self {
            extractor: SqlExtractor::from_config(&config.extraction),
            normalizer: CaseNormalizer::new(Arc::clone(&registry)),
            inference: ColumnInference::new(registry),
            parser: ResultParser::from_config(&config.results),
        })
    }

    pub fn extract_report(&self, text: &str) -> ExtractReport {
        let outcome = self.extractor.extract_with_outcome(text);
        ExtractReport {
            sql: outcome.sql,
            applied: outcome.applied,
            diagnostics: messages(&outcome.diagnostics),
        }
    }

    pub fn normalize_report(&self, sql: &str, with_corrections: bool) -> NormalizeReport {
        let sql = sql.trim();
        let outcome = self.normalizer.normalize_with_outcome(sql);
        let corrections = with_corrections.then(|| self.normalizer.diff(sql, &outcome.sql));
        NormalizeReport {
            sql: outcome.sql,
            corrections,
            diagnostics: messages(&outcome.diagnostics),
        }
    }

    pub fn infer_columns(&self, sql: &str) -> Vec<String> {
        self.inference.infer_columns(sql.trim())
    }

    pub fn parse_report(&self, raw: RawResult, hint: &[String]) -> ParseReport {
        self.parser.parse_with_outcome(raw, hint).into()
    }

    /// Model output to canonical SQL and its columns, then the result table
    /// when a raw result is given.
    pub fn run_report(&self, text: &str, raw: Option<RawResult>) -> RunReport {
        let extracted = self.extractor.extract_with_outcome(text);
        let mut diagnostics = extracted.diagnostics;

        let (sql, corrections, columns) = if extracted.sql.is_empty() {
            (String::new(), CorrectionReport::default(), Vec::new())
        } else {
            let normalized = self.normalizer.normalize_with_outcome(&extracted.sql);
            let corrections = self.normalizer.diff(&extracted.sql, &normalized.sql);
            diagnostics.extend(normalized.diagnostics);
            let columns = self.inference.infer_columns(&normalized.sql);
            (normalized.sql, corrections, columns)
        };

        let result = raw.map(|raw| {
            let outcome = self.parser.parse_with_outcome(raw, &columns);
            diagnostics.extend(outcome.diagnostics.iter().cloned());
            ParseReport::from(outcome)
        });

        RunReport {
            sql,
            applied: extracted.applied,
            corrections,
            columns,
            result,
            diagnostics: messages(&diagnostics),
        }
    }

    pub fn extract(&self, text: &str, json: bool) -> Result<()> {
        let report = self.extract_report(text);
        if json {
            return print_json(&report);
        }
        println!("{}", report.sql);
        Ok(())
    }

    pub fn normalize(&self, sql: &str, with_corrections: bool, json: bool) -> Result<()> {
        let report = self.normalize_report(sql, with_corrections);
        if json {
            return print_json(&report);
        }
        println!("{}", report.sql);
        if let Some(corrections) = &report.corrections {
            print_corrections(corrections);
        }
        Ok(())
    }

    pub fn columns(&self, sql: &str, json: bool) -> Result<()> {
        let columns = self.infer_columns(sql);
        if json {
            return print_json(&columns);
        }
        for column in &columns {
            println!("{column}");
        }
        Ok(())
    }

    pub fn parse_result(
        &self,
        text: String,
        format: InputFormat,
        hint: &[String],
        json: bool,
    ) -> Result<()> {
        let raw = raw_result(text, format)?;
        let report = self.parse_report(raw, hint);
        if json {
            return print_json(&report);
        }
        println!("{}", render_table(&report.table));
        Ok(())
    }

    pub fn run(
        &self,
        text: &str,
        raw: Option<String>,
        format: InputFormat,
        json: bool,
    ) -> Result<()> {
        let raw = raw.map(|text| raw_result(text, format)).transpose()?;
        let report = self.run_report(text, raw);
        if json {
            return print_json(&report);
        }

        if report.sql.is_empty() {
            println!("No SQL statement found.");
            return Ok(());
        }
        println!("{}", report.sql);
        print_corrections(&report.corrections);
        if !report.columns.is_empty() {
            println!("\nColumns: {}", report.columns.join(", "));
        }
        if let Some(result) = &report.result {
            println!("\n{}", render_table(&result.table));
        }
        Ok(())
    }
}

fn print_corrections(report: &CorrectionReport) {
    if report.no_changes {
        return;
    }
    println!();
    for correction in report
        .table_corrections
        .iter()
        .chain(&report.column_corrections)
    {
        println!("  fixed {correction}");
    }
}

fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(ToString::to_string).collect()
}
