//! Read-only schema registry.
//!
//! The registry maps canonical table names to their ordered canonical column
//! names and answers case-insensitive lookups through lowercase indexes that
//! are built once in [`SchemaRegistry::new`]. It has no interior mutability, so
//! one instance can be shared behind an `Arc` by any number of threads.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::SchemaConfig;

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A table name is empty or whitespace.
    #[error("table name must not be empty")]
    EmptyTableName,

    /// The same canonical table name was defined twice.
    #[error("table {table} is defined more than once")]
    DuplicateTable { table: String },

    /// A column name appears twice in one table.
    #[error("column {table}.{column} is defined more than once")]
    DuplicateColumn { table: String, column: String },

    /// A column name is empty or whitespace.
    #[error("table {table} has an empty column name")]
    EmptyColumnName { table: String },
}

/// One table with its canonical column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    columns: Vec<String>,
}

impl TableSchema {
    /// Canonical table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical column names in definition order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Case-insensitive column lookup returning the canonical spelling.
    pub fn canonical_column(&self, column: &str) -> Option<&str> {
        let lower = column.to_lowercase();
        self.columns
            .iter()
            .find(|c| c.to_lowercase() == lower)
            .map(String::as_str)
    }
}

/// Immutable table/column index with case-insensitive lookups.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: Vec<TableSchema>,
    /// lowercase table name -> index, only for lowercase forms owned by one table
    table_index: HashMap<String, usize>,
    /// lowercase forms shared by more than one table
    ambiguous_tables: HashSet<String>,
    /// lowercase column name -> canonical spelling, across all tables
    column_index: HashMap<String, String>,
    /// lowercase column forms spelled differently by different tables
    ambiguous_columns: HashSet<String>,
}

impl SchemaRegistry {
    /// Build a registry from `(table, columns)` pairs.
    pub fn new<I, T, C>(tables: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let mut registry = SchemaRegistry::default();
        let mut seen_tables = HashSet::new();
        let mut lowercase_owner: HashMap<String, usize> = HashMap::new();

        for (table, columns) in tables {
            let name: String = table.into();
            if name.trim().is_empty() {
                return Err(RegistryError::EmptyTableName);
            }
            if !seen_tables.insert(name.clone()) {
                return Err(RegistryError::DuplicateTable { table: name });
            }

            let mut seen_columns = HashSet::new();
            let mut canonical_columns = Vec::new();
            for column in columns {
                let column: String = column.into();
                if column.trim().is_empty() {
                    return Err(RegistryError::EmptyColumnName { table: name });
                }
                if !seen_columns.insert(column.clone()) {
                    return Err(RegistryError::DuplicateColumn {
                        table: name,
                        column,
                    });
                }
                registry.index_column(&column);
                canonical_columns.push(column);
            }

            let index = registry.tables.len();
            let lower = name.to_lowercase();
            if lowercase_owner.contains_key(&lower) {
                registry.ambiguous_tables.insert(lower);
            } else {
                lowercase_owner.insert(lower, index);
            }

            registry.tables.push(TableSchema {
                name,
                columns: canonical_columns,
            });
        }

        registry.table_index = lowercase_owner
            .into_iter()
            .filter(|(lower, _)| !registry.ambiguous_tables.contains(lower))
            .collect();

        tracing::debug!(
            tables = registry.tables.len(),
            columns = registry.column_index.len(),
            ambiguous_tables = registry.ambiguous_tables.len(),
            ambiguous_columns = registry.ambiguous_columns.len(),
            "built schema registry"
        );

        Ok(registry)
    }

    /// Build a registry from the `schema` section of the configuration.
    pub fn from_config(config: &SchemaConfig) -> Result<Self, RegistryError> {
        Self::new(
            config
                .tables
                .iter()
                .map(|(table, columns)| (table, columns.iter().cloned())),
        )
    }

    fn index_column(&mut self, column: &str) {
        let lower = column.to_lowercase();
        if self.ambiguous_columns.contains(&lower) {
            return;
        }
        match self.column_index.get(&lower) {
            Some(existing) if existing != column => {
                self.column_index.remove(&lower);
                self.ambiguous_columns.insert(lower);
            }
            Some(_) => {}
            None => {
                self.column_index.insert(lower, column.to_string());
            }
        }
    }

    /// All tables in definition order.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter()
    }

    /// Case-insensitive table lookup. Ambiguous lowercase forms only match exactly.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        if let Some(&index) = self.table_index.get(&name.to_lowercase()) {
            return self.tables.get(index);
        }
        self.tables.iter().find(|t| t.name == name)
    }

    /// Canonical spelling of a table name.
    pub fn canonical_table(&self, name: &str) -> Option<&str> {
        self.table(name).map(TableSchema::name)
    }

    /// Ordered canonical columns of a table.
    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.table(table).map(TableSchema::columns)
    }

    /// Canonical spelling of a column name, if exactly one spelling is known.
    pub fn canonical_column(&self, column: &str) -> Option<&str> {
        self.column_index
            .get(&column.to_lowercase())
            .map(String::as_str)
    }

    /// Whether a table's lowercase form identifies it uniquely.
    pub fn is_unambiguous_table(&self, name: &str) -> bool {
        self.table_index.contains_key(&name.to_lowercase())
    }

    /// Whether a column's lowercase form has a single canonical spelling.
    pub fn is_unambiguous_column(&self, column: &str) -> bool {
        self.column_index.contains_key(&column.to_lowercase())
    }

    /// Iterate `(table, column)` pairs in definition order.
    pub fn qualified_columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tables.iter().flat_map(|t| {
            t.columns
                .iter()
                .map(move |c| (t.name.as_str(), c.as_str()))
        })
    }

    /// Number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sales_registry() -> SchemaRegistry {
        SchemaRegistry::new([
            ("Customer", vec!["CustomerID", "FirstName", "LastName", "Email"]),
            ("Employee", vec!["EmployeeID", "FirstName", "LastName", "Salary"]),
            ("SalesOrder", vec!["SalesOrderID", "CustomerID", "Status"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_case_insensitive_table_lookup() {
        let registry = sales_registry();
        assert_eq!(registry.canonical_table("customer"), Some("Customer"));
        assert_eq!(registry.canonical_table("SALESORDER"), Some("SalesOrder"));
        assert_eq!(registry.canonical_table("missing"), None);
    }

    #[test]
    fn test_columns_keep_order() {
        let registry = sales_registry();
        assert_eq!(
            registry.columns("customer").unwrap(),
            ["CustomerID", "FirstName", "LastName", "Email"]
        );
    }

    #[test]
    fn test_shared_columns_are_unambiguous_when_spelled_alike() {
        let registry = sales_registry();
        assert_eq!(registry.canonical_column("firstname"), Some("FirstName"));
        assert_eq!(registry.canonical_column("customerid"), Some("CustomerID"));
    }

    #[test]
    fn test_ambiguous_column_spellings_are_excluded() {
        let registry =
            SchemaRegistry::new([("A", vec!["UserID"]), ("B", vec!["UserId"])]).unwrap();
        assert_eq!(registry.canonical_column("userid"), None);
        assert!(!registry.is_unambiguous_column("USERID"));
        assert_eq!(
            registry.table("b").unwrap().canonical_column("userid"),
            Some("UserId")
        );
    }

    #[test]
    fn test_ambiguous_tables_only_match_exactly() {
        let registry = SchemaRegistry::new([
            ("Users", vec!["Id"]),
            ("users", vec!["id"]),
        ])
        .unwrap();
        assert!(!registry.is_unambiguous_table("users"));
        assert_eq!(registry.canonical_table("users"), Some("users"));
        assert_eq!(registry.canonical_table("Users"), Some("Users"));
        assert_eq!(registry.canonical_table("USERS"), None);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let result = SchemaRegistry::new([("T", vec!["a"]), ("T", vec!["b"])]);
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateTable { table: "T".into() }
        );
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = SchemaRegistry::new([("T", vec!["a", "a"])]);
        assert!(matches!(result, Err(RegistryError::DuplicateColumn { .. })));
    }

    #[test]
    fn test_empty_names_rejected() {
        assert_eq!(
            SchemaRegistry::new([(" ", vec!["a"])]).unwrap_err(),
            RegistryError::EmptyTableName
        );
        assert!(matches!(
            SchemaRegistry::new([("T", vec![""])]),
            Err(RegistryError::EmptyColumnName { .. })
        ));
    }

    #[test]
    fn test_counts_and_pairs() {
        let registry = sales_registry();
        assert_eq!(registry.table_count(), 3);
        assert_eq!(registry.column_count(), 11);
        let first: Vec<_> = registry.qualified_columns().take(2).collect();
        assert_eq!(first, vec![("Customer", "CustomerID"), ("Customer", "FirstName")]);
    }

    #[test]
    fn test_from_config() {
        let config = SchemaConfig::from_yaml("tables:\n  Product: [ProductID, UnitPrice]\n").unwrap();
        let registry = SchemaRegistry::from_config(&config).unwrap();
        assert_eq!(registry.columns("PRODUCT").unwrap(), ["ProductID", "UnitPrice"]);
    }
}
