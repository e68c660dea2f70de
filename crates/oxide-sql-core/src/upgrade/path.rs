//! Dotted paths addressing schemas, tables and columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::UpgradeError;
use crate::model::QualifiedName;

/// Address of a schema, a table or a column: `schema[.table[.column]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath {
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub table: Option<String>,
    /// Column name; requires `table`.
    pub column: Option<String>,
}

impl NodePath {
    /// Path of a schema.
    #[must_use]
    pub fn schema(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: None,
            column: None,
        }
    }

    /// Path of a table.
    #[must_use]
    pub fn table(name: &QualifiedName) -> Self {
        Self {
            table: Some(name.name.clone()),
            ..Self::schema(name.schema.as_str())
        }
    }

    /// Path of a column.
    #[must_use]
    pub fn column(table: &QualifiedName, column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            ..Self::table(table)
        }
    }

    /// The table this path addresses or lies under.
    #[must_use]
    pub fn table_name(&self) -> Option<QualifiedName> {
        self.table
            .as_ref()
            .map(|table| QualifiedName::new(self.schema.as_str(), table.as_str()))
    }

    /// Nesting depth: 1 for schemas, 2 for tables, 3 for columns.
    #[must_use]
    pub const fn depth(&self) -> usize {
        match (&self.table, &self.column) {
            (None, _) => 1,
            (Some(_), None) => 2,
            (Some(_), Some(_)) => 3,
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.schema)?;
        if let Some(table) = &self.table {
            write!(f, ".{table}")?;
        }
        if let Some(column) = &self.column {
            write!(f, ".{column}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = UpgradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').map(str::trim).collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(UpgradeError::InvalidHint(format!("malformed path '{s}'")));
        }
        match parts.as_slice() {
            [schema] => Ok(Self::schema(*schema)),
            [schema, table] => Ok(Self::table(&QualifiedName::new(*schema, *table))),
            [schema, table, column] => Ok(Self::column(
                &QualifiedName::new(*schema, *table),
                *column,
            )),
            _ => Err(UpgradeError::InvalidHint(format!(
                "path '{s}' has more than three parts"
            ))),
        }
    }
}

impl TryFrom<String> for NodePath {
    type Error = UpgradeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_depth() {
        assert_eq!("main".parse::<NodePath>().unwrap().depth(), 1);
        let table: NodePath = "main.orders".parse().unwrap();
        assert_eq!(table.table_name(), Some(QualifiedName::new("main", "orders")));
        let column: NodePath = "main.orders.total".parse().unwrap();
        assert_eq!(column.depth(), 3);
        assert_eq!(column.to_string(), "main.orders.total");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!("main..total".parse::<NodePath>().is_err());
        assert!("a.b.c.d".parse::<NodePath>().is_err());
    }

    #[test]
    fn serializes_as_a_string() {
        let path = NodePath::column(&QualifiedName::new("main", "orders"), "total");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""main.orders.total""#);
        assert_eq!(serde_json::from_str::<NodePath>(&json).unwrap(), path);
    }
}
