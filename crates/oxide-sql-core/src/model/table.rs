//! Tables and columns.

use serde::{Deserialize, Serialize};

use super::catalog::QualifiedName;
use super::collection::{Named, NodeCollection, NodeKind, Rename};
use super::constraint::{Constraint, ConstraintKind, ForeignKey};
use super::error::{ModelError, Result};
use super::index::{Index, IndexColumn};
use super::sequence::SequenceDescriptor;
use super::types::SqlValueType;
use crate::ast::SqlExpression;

/// Whether a table is permanent or temporary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TableKind {
    /// A regular, persistent table.
    #[default]
    Regular,
    /// A temporary table.
    Temporary {
        /// Definition visible to every session.
        is_global: bool,
        /// Rows survive commit.
        preserve_rows: bool,
    },
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    name: String,
    /// Column type.
    pub data_type: SqlValueType,
    /// Accepts NULL.
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    /// Default value expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SqlExpression>,
    /// Column collation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    /// Identity (auto-increment) generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<SequenceDescriptor>,
}

const fn default_true() -> bool {
    true
}

impl TableColumn {
    /// Creates a nullable column without default.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<SqlValueType>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default_value: None,
            collation: None,
            identity: None,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: SqlExpression) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Makes the column an identity column.
    #[must_use]
    pub fn identity(mut self, descriptor: SequenceDescriptor) -> Self {
        self.identity = Some(descriptor);
        self
    }
}

impl Named for TableColumn {
    const KIND: NodeKind = NodeKind::Column;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Rename for TableColumn {
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A table with its columns, indexes and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    /// Permanent or temporary.
    #[serde(default)]
    pub kind: TableKind,
    #[serde(default)]
    columns: NodeCollection<TableColumn>,
    #[serde(default)]
    indexes: NodeCollection<Index>,
    #[serde(default)]
    constraints: NodeCollection<Constraint>,
}

impl Table {
    /// Creates an empty regular table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TableKind::Regular,
            columns: NodeCollection::new(),
            indexes: NodeCollection::new(),
            constraints: NodeCollection::new(),
        }
    }

    /// Creates an empty temporary table.
    #[must_use]
    pub fn temporary(name: impl Into<String>, is_global: bool, preserve_rows: bool) -> Self {
        Self {
            kind: TableKind::Temporary {
                is_global,
                preserve_rows,
            },
            ..Self::new(name)
        }
    }

    /// Returns `true` for temporary tables.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self.kind, TableKind::Temporary { .. })
    }

    // ---- columns ----

    /// Columns in ordinal order.
    #[must_use]
    pub const fn columns(&self) -> &NodeCollection<TableColumn> {
        &self.columns
    }

    /// Looks up a column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.get(name)
    }

    /// Looks up a column for mutation.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut TableColumn> {
        self.columns.get_mut(name)
    }

    /// Appends a new nullable column.
    pub fn create_column(
        &mut self,
        name: impl Into<String>,
        data_type: impl Into<SqlValueType>,
    ) -> Result<&mut TableColumn> {
        self.add_column(TableColumn::new(name, data_type))
    }

    /// Appends a prepared column.
    pub fn add_column(&mut self, column: TableColumn) -> Result<&mut TableColumn> {
        self.columns.push(&self.name, column)
    }

    /// Removes a column together with the indexes and constraints using it.
    pub fn remove_column(&mut self, name: &str) -> Option<TableColumn> {
        let removed = self.columns.remove(name)?;
        self.indexes
            .retain(|index| !index.column_names().any(|c| c == name));
        self.constraints
            .retain(|constraint| !constraint.local_columns().iter().any(|c| c == name));
        Some(removed)
    }

    /// Renames a column and every local index or constraint key using it.
    ///
    /// Foreign keys of other tables that reference this column are not
    /// touched; see [`crate::model::Catalog::rename_column`].
    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        self.columns.rename(&self.name, old, new)?;
        for index in self.indexes.iter_mut() {
            index.rename_column(old, new);
        }
        for constraint in self.constraints.iter_mut() {
            constraint.rename_column(old, new);
        }
        Ok(())
    }

    // ---- indexes ----

    /// Indexes in creation order.
    #[must_use]
    pub const fn indexes(&self) -> &NodeCollection<Index> {
        &self.indexes
    }

    /// Looks up an index.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(name)
    }

    /// Creates an index over existing columns.
    pub fn create_index(
        &mut self,
        name: impl Into<String>,
        columns: Vec<IndexColumn>,
    ) -> Result<&mut Index> {
        let mut index = Index::new(name);
        for column in columns {
            index.push_column(column);
        }
        self.add_index(index)
    }

    /// Attaches a prepared index after checking its columns.
    pub fn add_index(&mut self, index: Index) -> Result<&mut Index> {
        for column in index.column_names() {
            self.require_column(column)?;
        }
        self.indexes.push(&self.name, index)
    }

    /// Appends a key part to an existing index.
    pub fn add_index_column(&mut self, index_name: &str, column: IndexColumn) -> Result<()> {
        if let Some(name) = column.column_name() {
            self.require_column(name)?;
        }
        let table = &self.name;
        let index = self
            .indexes
            .get_mut(index_name)
            .ok_or_else(|| not_found(NodeKind::Index, index_name, table))?;
        index.push_column(column);
        Ok(())
    }

    /// Removes an index.
    pub fn remove_index(&mut self, name: &str) -> Option<Index> {
        self.indexes.remove(name)
    }

    // ---- constraints ----

    /// Constraints in creation order.
    #[must_use]
    pub const fn constraints(&self) -> &NodeCollection<Constraint> {
        &self.constraints
    }

    pub(crate) fn constraints_mut(&mut self) -> &mut NodeCollection<Constraint> {
        &mut self.constraints
    }

    /// Looks up a constraint.
    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.get(name)
    }

    /// The primary key, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.is_primary_key())
    }

    /// Iterates over the foreign keys.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&Constraint, &ForeignKey)> {
        self.constraints
            .iter()
            .filter_map(|c| c.as_foreign_key().map(|fk| (c, fk)))
    }

    /// Creates the primary key.
    pub fn create_primary_key(
        &mut self,
        name: impl Into<String>,
        columns: &[&str],
    ) -> Result<&mut Constraint> {
        self.add_constraint(Constraint::primary_key(name, columns))
    }

    /// Creates a unique constraint.
    pub fn create_unique_constraint(
        &mut self,
        name: impl Into<String>,
        columns: &[&str],
    ) -> Result<&mut Constraint> {
        self.add_constraint(Constraint::unique(name, columns))
    }

    /// Creates a check constraint.
    pub fn create_check_constraint(
        &mut self,
        name: impl Into<String>,
        condition: SqlExpression,
    ) -> Result<&mut Constraint> {
        self.add_constraint(Constraint::check(name, condition))
    }

    /// Creates a foreign key with no columns yet; add them with
    /// [`Table::add_foreign_key_columns`].
    pub fn create_foreign_key(
        &mut self,
        name: impl Into<String>,
        referenced_table: QualifiedName,
    ) -> Result<&mut Constraint> {
        self.add_constraint(Constraint::foreign_key(
            name,
            ForeignKey::new(referenced_table),
        ))
    }

    /// Appends a column pair to a foreign key.
    pub fn add_foreign_key_columns(
        &mut self,
        foreign_key: &str,
        column: &str,
        referenced_column: &str,
    ) -> Result<()> {
        self.require_column(column)?;
        let table = &self.name;
        let fk = self
            .constraints
            .get_mut(foreign_key)
            .and_then(Constraint::as_foreign_key_mut)
            .ok_or_else(|| not_found(NodeKind::Constraint, foreign_key, table))?;
        fk.push_pair(column.to_string(), referenced_column.to_string());
        Ok(())
    }

    /// Attaches a prepared constraint after checking its columns.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<&mut Constraint> {
        if constraint.is_primary_key() {
            if let Some(existing) = self.primary_key() {
                return Err(ModelError::MultiplePrimaryKeys {
                    table: self.name.clone(),
                    existing: existing.name().to_string(),
                });
            }
        }
        if let ConstraintKind::ForeignKey(fk) = &constraint.kind {
            if fk.columns().len() != fk.referenced_columns().len() {
                return Err(ModelError::ColumnCountMismatch {
                    name: constraint.name().to_string(),
                    referencing: fk.columns().len(),
                    referenced: fk.referenced_columns().len(),
                });
            }
        }
        for column in constraint.local_columns() {
            self.require_column(column)?;
        }
        self.constraints.push(&self.name, constraint)
    }

    /// Removes a constraint.
    pub fn remove_constraint(&mut self, name: &str) -> Option<Constraint> {
        self.constraints.remove(name)
    }

    pub(crate) fn rename_referenced_column(&mut self, target: &QualifiedName, old: &str, new: &str) {
        for constraint in self.constraints.iter_mut() {
            if let Some(fk) = constraint.as_foreign_key_mut() {
                if &fk.referenced_table == target {
                    fk.rename_referenced_column(old, new);
                }
            }
        }
    }

    pub(crate) fn retarget_foreign_keys(&mut self, old: &QualifiedName, new: &QualifiedName) {
        for constraint in self.constraints.iter_mut() {
            if let Some(fk) = constraint.as_foreign_key_mut() {
                if &fk.referenced_table == old {
                    fk.referenced_table = new.clone();
                }
            }
        }
    }

    fn require_column(&self, column: &str) -> Result<()> {
        if self.columns.contains(column) {
            Ok(())
        } else {
            Err(not_found(NodeKind::Column, column, &self.name))
        }
    }
}

impl Named for Table {
    const KIND: NodeKind = NodeKind::Table;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Rename for Table {
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

fn not_found(kind: NodeKind, name: &str, parent: &str) -> ModelError {
    ModelError::NotFound {
        kind,
        name: name.to_string(),
        parent: parent.to_string(),
    }
}
