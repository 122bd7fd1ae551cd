//! Configuration types for sqlscribe.
//!
//! Configuration is loaded from a YAML file (`sqlscribe.yaml`) and may pull the
//! table/column map from a separate schema file.
//!
//! # Configuration Files
//!
//! - **sqlscribe.yaml**: main file with the schema, heuristic extensions and logging
//! - **schema.yaml** (optional): the `tables` map only, referenced by `schema.schema_file`

pub mod schema;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use schema::{SchemaConfig, TableColumns};

/// Complete sqlscribe configuration loaded from files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlscribeConfig {
    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Configuration version.
    #[serde(default)]
    pub version: Option<String>,

    /// Table and column names known to the database.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Extensions to the SQL extraction heuristics.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Extensions to the result parsing heuristics.
    #[serde(default)]
    pub results: ResultsConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Extra phrases appended to the built-in extraction lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Label prefixes stripped from the start of model output (e.g. "Answer:").
    #[serde(default)]
    pub extra_prefixes: Vec<String>,

    /// Narration phrases that close a statement (e.g. "Hope this helps").
    #[serde(default)]
    pub extra_closing_phrases: Vec<String>,
}

/// Extra markers appended to the built-in result parsing lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsConfig {
    /// Phrases that mark a result string as "no rows".
    #[serde(default)]
    pub extra_empty_markers: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SqlscribeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration and resolve the external schema file, if any.
    ///
    /// A relative `schema.schema_file` is resolved against the directory of
    /// the configuration file. Tables from the schema file are appended after
    /// the inline ones.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(schema_file) = config.schema.schema_file.clone() {
            let external = SchemaConfig::load_from_path(&schema_file, &base_dir)?;
            tracing::debug!(
                file = %schema_file.display(),
                tables = external.tables.len(),
                "loaded external schema file"
            );
            config.schema.tables.extend(external.tables);
        }

        Ok(config)
    }
}
