//! Loading configuration files from disk and building a registry from them.

use std::fs;

use pretty_assertions::assert_eq;
use sqlscribe_core::{ConfigError, SchemaRegistry, SqlscribeConfig};

#[test]
fn test_load_with_external_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("schema.yaml"),
        "tables:\n  SalesOrder: [SalesOrderID, CustomerID, Status]\n",
    )
    .unwrap();
    let config_path = dir.path().join("sqlscribe.yaml");
    fs::write(
        &config_path,
        r#"
project: sales
schema:
  schema_file: schema.yaml
  tables:
    Customer: [CustomerID, FirstName]
"#,
    )
    .unwrap();

    let config = SqlscribeConfig::load_with_context(&config_path).unwrap();
    let names: Vec<&str> = config.schema.tables.iter().map(|(t, _)| t).collect();
    assert_eq!(names, vec!["Customer", "SalesOrder"]);

    let registry = SchemaRegistry::from_config(&config.schema).unwrap();
    assert_eq!(registry.canonical_table("salesorder"), Some("SalesOrder"));
    assert_eq!(registry.canonical_column("status"), Some("Status"));
}

#[test]
fn test_missing_external_schema_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("sqlscribe.yaml");
    fs::write(&config_path, "schema:\n  schema_file: nowhere.yaml\n").unwrap();

    let result = SqlscribeConfig::load_with_context(&config_path);
    assert!(matches!(result, Err(ConfigError::Config(_))));
}

#[test]
fn test_missing_config_file_is_io_error() {
    let result = SqlscribeConfig::from_file("/definitely/not/here.yaml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}
