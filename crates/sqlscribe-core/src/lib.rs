//! # sqlscribe-core
//!
//! Shared building blocks for the sqlscribe pipeline:
//!
//! - [`config`]: YAML configuration (`sqlscribe.yaml`) with the table/column map
//!   and the tunable heuristics of the extraction and result stages
//! - [`SchemaRegistry`]: the read-only, case-insensitive table/column index that
//!   is built once and shared by every stage
//! - [`Table`] / [`Cell`]: the typed tabular output of result parsing
//! - [`Diagnostic`]: the non-fatal outcomes stages report instead of failing
//!
//! ## Pipeline
//!
//! ```text
//! raw LLM text -> SqlExtractor -> CaseNormalizer -> (execution, external)
//!              -> raw result -> ResultParser -> Table
//! ```

pub mod config;
pub mod diagnostic;
pub mod registry;
pub mod table;

pub use config::{
    ConfigError, ExtractionConfig, LogFormat, LoggingConfig, ResultsConfig, SchemaConfig,
    SqlscribeConfig, TableColumns,
};
pub use diagnostic::Diagnostic;
pub use registry::{RegistryError, SchemaRegistry, TableSchema};
pub use table::{Cell, Table, RESULT_COLUMN};
