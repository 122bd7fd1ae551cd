//! SQL parsing and SELECT-list analysis.

use crate::error::SqlError;
use sqlparser::ast::{Expr, SelectItem, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

/// Parses statements and describes the shape of a SELECT.
pub struct SqlAnalyzer {
    dialect: MySqlDialect,
}

impl Clone for SqlAnalyzer {
    fn clone(&self) -> Self {
        Self {
            dialect: MySqlDialect {},
        }
    }
}

impl std::fmt::Debug for SqlAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlAnalyzer")
            .field("dialect", &"mysql")
            .finish()
    }
}

impl Default for SqlAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlAnalyzer {
    /// Create a new SQL analyzer.
    pub fn new() -> Self {
        Self {
            dialect: MySqlDialect {},
        }
    }

    /// Parse a SQL string into statements.
    pub fn parse(&self, sql: &str) -> Result<Vec<Statement>, SqlError> {
        Parser::parse_sql(&self.dialect, sql).map_err(|e| SqlError::ParseError(e.to_string()))
    }

    /// Parse a single SELECT and describe its projection and tables.
    pub fn analyze_select(&self, sql: &str) -> Result<SelectShape, SqlError> {
        let statements = self.parse(sql)?;
        let stmt = statements.first().ok_or(SqlError::NoStatement)?;
        self.select_shape(stmt)
    }

    /// Describe the projection and FROM tables of a SELECT statement.
    pub fn select_shape(&self, stmt: &Statement) -> Result<SelectShape, SqlError> {
        let Statement::Query(query) = stmt else {
            return Err(SqlError::NotSelect);
        };
        let select = query.body.as_select().ok_or(SqlError::NotSelect)?;

        let mut tables = Vec::new();
        for table_with_joins in &select.from {
            self.visit_table_with_joins(table_with_joins, &mut tables);
        }

        let projection = select.projection.iter().map(projection_item).collect();

        Ok(SelectShape { projection, tables })
    }

    fn visit_table_with_joins(
        &self,
        table_with_joins: &TableWithJoins,
        tables: &mut Vec<TableReference>,
    ) {
        if let Some(table) = self.table_reference(&table_with_joins.relation) {
            tables.push(table);
        }
        for join in &table_with_joins.joins {
            if let Some(table) = self.table_reference(&join.relation) {
                tables.push(table);
            }
        }
    }

    fn table_reference(&self, table_factor: &TableFactor) -> Option<TableReference> {
        match table_factor {
            TableFactor::Table { name, alias, .. } => Some(TableReference {
                name: unquote(last_segment(&name.to_string())).to_string(),
                alias: alias.as_ref().map(|a| a.name.value.clone()),
            }),
            _ => None,
        }
    }
}

fn projection_item(item: &SelectItem) -> ProjectionItem {
    match item {
        SelectItem::UnnamedExpr(expr) => ProjectionItem::Named(expression_name(expr)),
        SelectItem::ExprWithAlias { alias, .. } => ProjectionItem::Named(alias.value.clone()),
        SelectItem::QualifiedWildcard(..) => {
            let text = item.to_string();
            let qualifier = text.split(".*").next().unwrap_or_default();
            ProjectionItem::QualifiedWildcard(unquote(last_segment(qualifier)).to_string())
        }
        SelectItem::Wildcard(_) => ProjectionItem::Wildcard,
    }
}

fn expression_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .map(|ident| ident.value.clone())
            .unwrap_or_default(),
        Expr::Nested(inner) => expression_name(inner),
        other => other.to_string(),
    }
}

/// Last dot-separated part of a possibly qualified name.
pub(crate) fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name).trim()
}

/// Strip one layer of backticks or quotes.
pub(crate) fn unquote(name: &str) -> &str {
    name.trim_matches(|c| c == '`' || c == '"' || c == '\'')
}

/// Projection and FROM tables of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectShape {
    pub projection: Vec<ProjectionItem>,
    /// FROM and JOIN tables in order of appearance.
    pub tables: Vec<TableReference>,
}

impl SelectShape {
    /// Table referenced by `qualifier`, matching aliases before names.
    pub fn resolve(&self, qualifier: &str) -> Option<&TableReference> {
        self.tables
            .iter()
            .find(|t| {
                t.alias
                    .as_deref()
                    .is_some_and(|a| a.eq_ignore_ascii_case(qualifier))
            })
            .or_else(|| {
                self.tables
                    .iter()
                    .find(|t| t.name.eq_ignore_ascii_case(qualifier))
            })
    }
}

/// One entry of a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionItem {
    /// Alias, last identifier part, or expression text.
    Named(String),
    /// `*`
    Wildcard,
    /// `qualifier.*`
    QualifiedWildcard(String),
}

/// A reference to a table in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    /// The table name without schema or quotes.
    pub name: String,
    /// Optional alias.
    pub alias: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_select() {
        let analyzer = SqlAnalyzer::new();
        let stmts = analyzer.parse("SELECT * FROM Customer").unwrap();
        assert_eq!(stmts.len(), 1);

        let shape = analyzer.select_shape(&stmts[0]).unwrap();
        assert_eq!(shape.projection, vec![ProjectionItem::Wildcard]);
        assert_eq!(shape.tables[0].name, "Customer");
    }

    #[test]
    fn test_projection_names() {
        let analyzer = SqlAnalyzer::new();
        let shape = analyzer
            .analyze_select("SELECT c.FirstName, Email, COUNT(*) AS total FROM Customer c GROUP BY c.FirstName, Email")
            .unwrap();
        assert_eq!(
            shape.projection,
            vec![
                ProjectionItem::Named("FirstName".into()),
                ProjectionItem::Named("Email".into()),
                ProjectionItem::Named("total".into()),
            ]
        );
    }

    #[test]
    fn test_join_aliases_and_qualified_wildcard() {
        let analyzer = SqlAnalyzer::new();
        let shape = analyzer
            .analyze_select("SELECT o.*, `u`.Email FROM SalesOrder o JOIN `Customer` u ON o.CustomerID = u.CustomerID")
            .unwrap();
        assert_eq!(shape.projection[0], ProjectionItem::QualifiedWildcard("o".into()));
        assert_eq!(shape.projection[1], ProjectionItem::Named("Email".into()));
        assert_eq!(shape.tables.len(), 2);
        assert_eq!(shape.tables[1].name, "Customer");
        assert_eq!(shape.resolve("U").unwrap().name, "Customer");
        assert_eq!(shape.resolve("salesorder").unwrap().alias.as_deref(), Some("o"));
    }

    #[test]
    fn test_expression_text() {
        let analyzer = SqlAnalyzer::new();
        let shape = analyzer.analyze_select("SELECT SUM(Quantity) FROM LineItem").unwrap();
        assert_eq!(
            shape.projection,
            vec![ProjectionItem::Named("SUM(Quantity)".into())]
        );
    }

    #[test]
    fn test_not_select() {
        let analyzer = SqlAnalyzer::new();
        let result = analyzer.analyze_select("DELETE FROM Customer WHERE CustomerID = 1");
        assert!(matches!(result, Err(SqlError::NotSelect)));
    }

    #[test]
    fn test_parse_error() {
        let analyzer = SqlAnalyzer::new();
        let result = analyzer.analyze_select("SELECT a FROM t WHERE");
        assert!(matches!(result, Err(SqlError::ParseError(_))));
    }
}
