//! # sqlscribe-sql
//!
//! Turns free-form language-model output into a single executable SQL
//! statement whose identifiers match the schema.
//!
//! This crate provides:
//! - [`SqlExtractor`]: an ordered chain of extraction tiers that pulls one
//!   statement out of fenced blocks, labelled answers and trailing narration
//! - [`CaseNormalizer`]: lexical rewriting of table and column casing against
//!   a [`SchemaRegistry`](sqlscribe_core::SchemaRegistry)
//! - [`ColumnInference`]: display column names for a statement, expanding
//!   `SELECT *` through the registry
//!
//! ## Example
//!
//! **Model output:**
//! ````text
//! SQL语句:
//! ```sql
//! select firstname from customer;
//! ```
//! 以上就是查询语句
//! ````
//!
//! **After extraction and normalization:**
//! ```sql
//! select FirstName from Customer
//! ```
//!
//! Neither stage validates SQL semantics or sanitizes input; they are a
//! syntactic cleanup step in front of an external executor.

pub mod analyzer;
pub mod columns;
pub mod error;
pub mod extractor;
pub mod keywords;
pub mod normalizer;

pub use analyzer::SqlAnalyzer;
pub use columns::ColumnInference;
pub use error::SqlError;
pub use extractor::{ExtractionOutcome, ExtractionTier, SqlExtractor};
pub use normalizer::{CaseNormalizer, CorrectionReport, NormalizationOutcome};
