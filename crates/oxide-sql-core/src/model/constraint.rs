//! Table constraints.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::QualifiedName;
use super::collection::{Named, NodeKind, Rename};
use crate::ast::SqlExpression;

/// Action taken on referencing rows when the referenced key changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// Reject the change (also covers `RESTRICT`).
    #[default]
    NoAction,
    /// Propagate the change.
    Cascade,
    /// Set referencing columns to NULL.
    SetNull,
    /// Set referencing columns to their defaults.
    SetDefault,
}

impl ReferentialAction {
    /// SQL spelling of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Referencing/referenced column pairs plus cascade rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// The referenced table.
    pub referenced_table: QualifiedName,
    columns: Vec<String>,
    referenced_columns: Vec<String>,
    /// Action on delete of the referenced row.
    #[serde(default)]
    pub on_delete: ReferentialAction,
    /// Action on update of the referenced key.
    #[serde(default)]
    pub on_update: ReferentialAction,
}

impl ForeignKey {
    /// Creates a foreign key without columns.
    #[must_use]
    pub const fn new(referenced_table: QualifiedName) -> Self {
        Self {
            referenced_table,
            columns: Vec::new(),
            referenced_columns: Vec::new(),
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }

    /// Appends a column pair.
    #[must_use]
    pub fn with_columns(mut self, column: impl Into<String>, referenced: impl Into<String>) -> Self {
        self.push_pair(column.into(), referenced.into());
        self
    }

    /// Sets the delete rule.
    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Referencing columns in key order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Referenced columns in key order.
    #[must_use]
    pub fn referenced_columns(&self) -> &[String] {
        &self.referenced_columns
    }

    /// Iterates over `(referencing, referenced)` pairs.
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(&self.referenced_columns)
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub(crate) fn push_pair(&mut self, column: String, referenced: String) {
        self.columns.push(column);
        self.referenced_columns.push(referenced);
    }

    pub(crate) fn rename_column(&mut self, old: &str, new: &str) {
        rename_in(&mut self.columns, old, new);
    }

    pub(crate) fn rename_referenced_column(&mut self, old: &str, new: &str) {
        rename_in(&mut self.referenced_columns, old, new);
    }
}

/// What a constraint enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Primary key over the listed columns.
    PrimaryKey {
        /// Key columns.
        columns: Vec<String>,
    },
    /// Unique key over the listed columns.
    Unique {
        /// Key columns.
        columns: Vec<String>,
    },
    /// Reference to another table.
    ForeignKey(ForeignKey),
    /// Row predicate.
    Check {
        /// The predicate.
        condition: SqlExpression,
    },
}

/// A named table constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    name: String,
    /// The constraint body.
    pub kind: ConstraintKind,
    /// Checking may be deferred to commit.
    #[serde(default)]
    pub is_deferrable: bool,
    /// Checking is deferred by default.
    #[serde(default)]
    pub is_initially_deferred: bool,
}

impl Constraint {
    /// Creates a constraint.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_deferrable: false,
            is_initially_deferred: false,
        }
    }

    /// Primary key constraint.
    #[must_use]
    pub fn primary_key(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(
            name,
            ConstraintKind::PrimaryKey {
                columns: to_strings(columns),
            },
        )
    }

    /// Unique constraint.
    #[must_use]
    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(
            name,
            ConstraintKind::Unique {
                columns: to_strings(columns),
            },
        )
    }

    /// Check constraint.
    #[must_use]
    pub fn check(name: impl Into<String>, condition: SqlExpression) -> Self {
        Self::new(name, ConstraintKind::Check { condition })
    }

    /// Foreign key constraint.
    #[must_use]
    pub fn foreign_key(name: impl Into<String>, foreign_key: ForeignKey) -> Self {
        Self::new(name, ConstraintKind::ForeignKey(foreign_key))
    }

    /// Marks the constraint deferrable.
    #[must_use]
    pub fn deferrable(mut self, initially_deferred: bool) -> Self {
        self.is_deferrable = true;
        self.is_initially_deferred = initially_deferred;
        self
    }

    /// Returns `true` for primary keys.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::PrimaryKey { .. })
    }

    /// The foreign key body, if this is one.
    #[must_use]
    pub const fn as_foreign_key(&self) -> Option<&ForeignKey> {
        match &self.kind {
            ConstraintKind::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }

    pub(crate) fn as_foreign_key_mut(&mut self) -> Option<&mut ForeignKey> {
        match &mut self.kind {
            ConstraintKind::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }

    /// Columns of the owning table this constraint covers.
    #[must_use]
    pub fn local_columns(&self) -> &[String] {
        match &self.kind {
            ConstraintKind::PrimaryKey { columns } | ConstraintKind::Unique { columns } => columns,
            ConstraintKind::ForeignKey(fk) => fk.columns(),
            ConstraintKind::Check { .. } => &[],
        }
    }

    pub(crate) fn rename_column(&mut self, old: &str, new: &str) {
        match &mut self.kind {
            ConstraintKind::PrimaryKey { columns } | ConstraintKind::Unique { columns } => {
                rename_in(columns, old, new);
            }
            ConstraintKind::ForeignKey(fk) => fk.rename_column(old, new),
            ConstraintKind::Check { .. } => {}
        }
    }
}

impl Named for Constraint {
    const KIND: NodeKind = NodeKind::Constraint;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Rename for Constraint {
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

fn to_strings(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

fn rename_in(columns: &mut [String], old: &str, new: &str) {
    for column in columns.iter_mut().filter(|c| c.as_str() == old) {
        new.clone_into(column);
    }
}
