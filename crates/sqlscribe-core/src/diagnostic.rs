//! Non-fatal pipeline outcomes.
//!
//! None of the pipeline stages fail: they degrade and record what happened as a
//! [`Diagnostic`] on their outcome so the caller can surface a warning.

use thiserror::Error;

/// Something a stage recovered from on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// No statement keyword was found anywhere in the model output.
    #[error("no SQL statement found in input")]
    ExtractionEmpty,

    /// No identifier matched a known table or column.
    #[error("no identifier casing was changed")]
    NormalizationNoOp,

    /// The bounded literal grammar rejected the input; the manual tokenizer ran instead.
    #[error("literal parse failed at byte {offset}: {reason}")]
    LiteralParseFailure { offset: usize, reason: String },

    /// Hinted column names did not fit the row widths; generic names were used.
    #[error("expected {expected} columns but rows have {found}")]
    RowWidthMismatch { expected: usize, found: usize },

    /// Nothing could be parsed; the input was wrapped in a single cell.
    #[error("result could not be parsed: {reason}")]
    TotalFailure { reason: String },
}

impl Diagnostic {
    /// Whether the caller should show this to the user as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::ExtractionEmpty | Diagnostic::TotalFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_classification() {
        assert!(Diagnostic::ExtractionEmpty.is_warning());
        assert!(Diagnostic::TotalFailure { reason: "x".into() }.is_warning());
        assert!(!Diagnostic::NormalizationNoOp.is_warning());
        assert!(
            !Diagnostic::RowWidthMismatch {
                expected: 3,
                found: 2
            }
            .is_warning()
        );
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::RowWidthMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(d.to_string(), "expected 3 columns but rows have 2");
    }
}
