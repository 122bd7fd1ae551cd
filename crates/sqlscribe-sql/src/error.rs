//! Error types for the SQL crate.

use thiserror::Error;

/// Errors raised by the SQL analyzer.
///
/// The public pipeline stages never return these: column inference falls back
/// to a lexical split when parsing fails.
#[derive(Debug, Error)]
pub enum SqlError {
    /// SQL parsing failed.
    #[error("failed to parse SQL: {0}")]
    ParseError(String),

    /// The input parsed to zero statements.
    #[error("no statement in input")]
    NoStatement,

    /// The statement is not a plain SELECT.
    #[error("not a SELECT statement")]
    NotSelect,
}
