//! Indexes.

use serde::{Deserialize, Serialize};

use super::collection::{Named, NodeKind, Rename};
use crate::ast::SqlExpression;

/// What an index column is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexTarget {
    /// A column of the owning table.
    Column(String),
    /// A functional expression.
    Expression(SqlExpression),
}

/// One key part of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumn {
    /// Column or expression.
    pub target: IndexTarget,
    /// Sort direction.
    pub ascending: bool,
}

impl IndexColumn {
    /// Ascending key on a column.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            target: IndexTarget::Column(name.into()),
            ascending: true,
        }
    }

    /// Ascending key on an expression.
    #[must_use]
    pub const fn expression(expression: SqlExpression) -> Self {
        Self {
            target: IndexTarget::Expression(expression),
            ascending: true,
        }
    }

    /// Switches the key to descending order.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    /// The column name, unless this is an expression key.
    #[must_use]
    pub fn column_name(&self) -> Option<&str> {
        match &self.target {
            IndexTarget::Column(name) => Some(name),
            IndexTarget::Expression(_) => None,
        }
    }
}

/// An index on a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    name: String,
    columns: Vec<IndexColumn>,
    /// Enforces uniqueness of the key.
    #[serde(default)]
    pub is_unique: bool,
    /// Bitmap index.
    #[serde(default)]
    pub is_bitmap: bool,
    /// Clustered index.
    #[serde(default)]
    pub is_clustered: bool,
    /// Page fill factor in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_factor: Option<u8>,
    /// Predicate of a partial index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<SqlExpression>,
}

impl Index {
    /// Creates an empty, non-unique index.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            is_unique: false,
            is_bitmap: false,
            is_clustered: false,
            fill_factor: None,
            filter: None,
        }
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Makes the index partial.
    #[must_use]
    pub fn filtered(mut self, filter: SqlExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Adds a key part. Column existence is checked when the index is
    /// attached to a table.
    #[must_use]
    pub fn with_column(mut self, column: IndexColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// The key parts in order.
    #[must_use]
    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Names of the plain column keys.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(IndexColumn::column_name)
    }

    /// Returns `true` if any key part is an expression.
    #[must_use]
    pub fn is_functional(&self) -> bool {
        self.columns.iter().any(|c| c.column_name().is_none())
    }

    pub(crate) fn push_column(&mut self, column: IndexColumn) {
        self.columns.push(column);
    }

    pub(crate) fn rename_column(&mut self, old: &str, new: &str) {
        for column in &mut self.columns {
            if let IndexTarget::Column(name) = &mut column.target {
                if name == old {
                    new.clone_into(name);
                }
            }
        }
    }
}

impl Named for Index {
    const KIND: NodeKind = NodeKind::Index;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Rename for Index {
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
