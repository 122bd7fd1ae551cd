//! SQL extraction from model output.
//!
//! [`SqlExtractor`] runs an ordered list of [`ExtractionTier`]s over the raw
//! text. Rewrite tiers each get a chance to narrow or clean the text; capture
//! tiers are alternatives, and once one of them captures a statement the
//! remaining capture tiers are skipped. The result either starts with a
//! statement keyword or is empty.

mod tiers;

use sqlscribe_core::{Diagnostic, ExtractionConfig};

use crate::keywords;

pub use tiers::{
    strip_trailing_markers, FencedBlock, FirstStatement, KeywordRescue, LabelPrefix,
    LineAssembly, NarrationTruncation, NormalizeWhitespace, RegexCapture, TrailingTerminator,
    DEFAULT_CLOSING_PHRASES, DEFAULT_LABEL_PREFIXES, DEFAULT_STOP_PHRASES,
};

/// How a tier participates in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierRole {
    /// Always runs; may rewrite the text.
    Rewrite,
    /// Runs until one capture tier succeeds.
    Capture,
}

/// One self-contained, total step of the extraction chain.
pub trait ExtractionTier: Send + Sync {
    /// Stable name used in logs and outcomes.
    fn name(&self) -> &'static str;

    fn role(&self) -> TierRole {
        TierRole::Rewrite
    }

    /// Rewritten text, or `None` when the tier does not apply.
    fn apply(&self, text: &str) -> Option<String>;
}

/// Result of one extraction with the tiers that changed the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Canonical SQL, empty when nothing was found.
    pub sql: String,
    /// Names of the tiers that rewrote the text, in order.
    pub applied: Vec<&'static str>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionOutcome {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Pulls a single SQL statement out of untrusted text.
pub struct SqlExtractor {
    tiers: Vec<Box<dyn ExtractionTier>>,
}

impl Default for SqlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SqlExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlExtractor")
            .field("tiers", &self.tier_names())
            .finish()
    }
}

impl SqlExtractor {
    /// Create an extractor with the built-in phrase lists.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create an extractor whose phrase lists are extended by configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let prefixes = merged(DEFAULT_LABEL_PREFIXES, &config.extra_prefixes);
        let stop_phrases = merged(DEFAULT_STOP_PHRASES, &config.extra_closing_phrases);
        let closing_phrases = merged(DEFAULT_CLOSING_PHRASES, &config.extra_closing_phrases);

        Self::with_tiers(vec![
            Box::new(FencedBlock),
            Box::new(LabelPrefix::new(prefixes)),
            Box::new(LineAssembly::new(stop_phrases)),
            Box::new(RegexCapture::new()),
            Box::new(FirstStatement),
            Box::new(KeywordRescue),
            Box::new(NormalizeWhitespace),
            Box::new(NarrationTruncation::new(closing_phrases)),
            Box::new(TrailingTerminator),
        ])
    }

    /// Create an extractor from an explicit tier list.
    pub fn with_tiers(tiers: Vec<Box<dyn ExtractionTier>>) -> Self {
        Self { tiers }
    }

    /// Names of the configured tiers, in order.
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Extract canonical SQL; empty string when nothing was found.
    pub fn extract(&self, raw: &str) -> String {
        self.extract_with_outcome(raw).sql
    }

    /// Extract canonical SQL and report which tiers fired.
    pub fn extract_with_outcome(&self, raw: &str) -> ExtractionOutcome {
        let mut text = raw.trim().to_string();
        let mut applied = Vec::new();

        if text.is_empty() {
            return empty_outcome(applied);
        }

        let mut captured = false;
        for tier in &self.tiers {
            let role = tier.role();
            if role == TierRole::Capture && captured {
                continue;
            }

            if let Some(next) = tier.apply(&text) {
                if role == TierRole::Capture {
                    captured = true;
                }
                if next != text {
                    tracing::debug!(
                        tier = tier.name(),
                        before = %text,
                        after = %next,
                        "extraction tier applied"
                    );
                    applied.push(tier.name());
                    text = next;
                }
            }
        }

        if !keywords::starts_with_statement_keyword(&text) {
            return empty_outcome(applied);
        }

        ExtractionOutcome {
            sql: text,
            applied,
            diagnostics: Vec::new(),
        }
    }
}

fn empty_outcome(applied: Vec<&'static str>) -> ExtractionOutcome {
    tracing::warn!("no SQL statement found in model output");
    ExtractionOutcome {
        sql: String::new(),
        applied,
        diagnostics: vec![Diagnostic::ExtractionEmpty],
    }
}

fn merged(defaults: &[&str], extra: &[String]) -> Vec<String> {
    defaults
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().filter(|s| !s.trim().is_empty()).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fenced_block() {
        let extractor = SqlExtractor::new();
        assert_eq!(extractor.extract("```sql\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_trailing_narration() {
        let extractor = SqlExtractor::new();
        assert_eq!(
            extractor.extract("SELECT * FROM Customer 以上就是查询语句"),
            "SELECT * FROM Customer"
        );
    }

    #[test]
    fn test_empty_input() {
        let extractor = SqlExtractor::new();
        let outcome = extractor.extract_with_outcome("   \n  ");
        assert!(outcome.is_empty());
        assert_eq!(outcome.diagnostics, vec![Diagnostic::ExtractionEmpty]);
    }

    #[test]
    fn test_no_sql_anywhere() {
        let extractor = SqlExtractor::new();
        let outcome = extractor.extract_with_outcome("对不起，我无法回答这个问题。");
        assert_eq!(outcome.sql, "");
        assert_eq!(outcome.diagnostics, vec![Diagnostic::ExtractionEmpty]);
    }

    #[test]
    fn test_outcome_lists_applied_tiers() {
        let extractor = SqlExtractor::new();
        let outcome = extractor.extract_with_outcome("```sql\nSELECT  1;\n```");
        assert_eq!(outcome.sql, "SELECT 1");
        assert_eq!(outcome.applied[0], "fenced_block");
        assert!(outcome.applied.contains(&"normalize_whitespace"));
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_capture_tiers_are_alternatives() {
        let extractor = SqlExtractor::new();
        let outcome = extractor.extract_with_outcome("SELECT a\nFROM t");
        assert!(outcome.applied.contains(&"line_assembly"));
        assert!(!outcome.applied.contains(&"regex_capture"));
        assert_eq!(outcome.sql, "SELECT a FROM t");
    }

    #[test]
    fn test_configured_phrases() {
        let config = ExtractionConfig {
            extra_prefixes: vec!["Answer:".to_string()],
            extra_closing_phrases: vec!["Hope this helps".to_string()],
        };
        let extractor = SqlExtractor::from_config(&config);
        assert_eq!(
            extractor.extract("Answer: SELECT id FROM t Hope this helps!"),
            "SELECT id FROM t"
        );
    }

    #[test]
    fn test_keyword_inside_a_word_starts_the_statement() {
        // Keyword search is substring based, so "selected" opens the statement.
        let extractor = SqlExtractor::new();
        assert_eq!(
            extractor.extract("I selected the rows from the table below:\nSELECT a FROM t"),
            "selected the rows from the table below: SELECT a FROM t"
        );
    }

    #[test]
    fn test_default_tier_order() {
        let extractor = SqlExtractor::new();
        assert_eq!(
            extractor.tier_names(),
            vec![
                "fenced_block",
                "label_prefix",
                "line_assembly",
                "regex_capture",
                "first_statement",
                "keyword_rescue",
                "normalize_whitespace",
                "narration_truncation",
                "trailing_terminator",
            ]
        );
    }
}
