//! Schema configuration: the table to column map.
//!
//! Tables are kept in file order so that the registry, and everything that
//! iterates it, is deterministic.
//!
//! ```yaml
//! tables:
//!   Customer: [CustomerID, FirstName, LastName]
//!   SalesOrder: [SalesOrderID, CustomerID, OrderDate]
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::ConfigError;

/// Table definitions, inline or from a separate file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Canonical table name to its ordered canonical column names.
    #[serde(default)]
    pub tables: TableColumns,

    /// Path to a YAML file holding additional `tables`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_file: Option<PathBuf>,
}

impl SchemaConfig {
    /// Load a schema file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a schema from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load a schema file relative to a base directory.
    ///
    /// Absolute paths are used directly.
    pub fn load_from_path(
        schema_file: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let schema_file = schema_file.as_ref();
        let schema_path = if schema_file.is_absolute() {
            schema_file.to_path_buf()
        } else {
            base_dir.as_ref().join(schema_file)
        };

        if schema_path.exists() {
            Self::from_file(&schema_path)
        } else {
            Err(ConfigError::Config(format!(
                "Schema file not found: {}",
                schema_path.display()
            )))
        }
    }
}

/// Ordered list of `(table, columns)` pairs, written as a YAML map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableColumns(Vec<(String, Vec<String>)>);

impl TableColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table definition.
    pub fn push(&mut self, table: impl Into<String>, columns: Vec<String>) {
        self.0.push((table.into(), columns));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(table, columns)| (table.as_str(), columns.as_slice()))
    }
}

impl Extend<(String, Vec<String>)> for TableColumns {
    fn extend<I: IntoIterator<Item = (String, Vec<String>)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for TableColumns {
    type Item = (String, Vec<String>);
    type IntoIter = std::vec::IntoIter<(String, Vec<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T: Into<String>> FromIterator<(T, Vec<String>)> for TableColumns {
    fn from_iter<I: IntoIterator<Item = (T, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(t, c)| (t.into(), c)).collect())
    }
}

impl Serialize for TableColumns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (table, columns) in &self.0 {
            map.serialize_entry(table, columns)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TableColumns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableColumnsVisitor;

        impl<'de> Visitor<'de> for TableColumnsVisitor {
            type Value = TableColumns;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of table names to column name lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut tables = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((table, columns)) = access.next_entry::<String, Vec<String>>()? {
                    tables.push((table, columns));
                }
                Ok(TableColumns(tables))
            }
        }

        deserializer.deserialize_map(TableColumnsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_preserves_file_order() {
        let yaml = r#"
tables:
  Zebra: [Id]
  Customer: [CustomerID, FirstName]
  Apple: [Id, Name]
"#;

        let schema = SchemaConfig::from_yaml(yaml).unwrap();
        let names: Vec<&str> = schema.tables.iter().map(|(t, _)| t).collect();
        assert_eq!(names, vec!["Zebra", "Customer", "Apple"]);

        let (_, columns) = schema.tables.iter().nth(1).unwrap();
        assert_eq!(columns, ["CustomerID", "FirstName"]);
    }

    #[test]
    fn test_roundtrip_yaml() {
        let mut tables = TableColumns::new();
        tables.push("Product", vec!["ProductID".into(), "ProductName".into()]);
        let schema = SchemaConfig {
            tables,
            schema_file: None,
        };

        let yaml = serde_yaml::to_string(&schema).unwrap();
        let parsed = SchemaConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.tables, schema.tables);
    }

    #[test]
    fn test_missing_schema_file() {
        let result = SchemaConfig::load_from_path("does-not-exist.yaml", "/nonexistent");
        assert!(matches!(result, Err(ConfigError::Config(_))));
    }
}
