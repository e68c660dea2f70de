//! User-supplied rename and removal hints.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::error::{Result, UpgradeError};
use super::path::NodePath;
use crate::model::{Catalog, QualifiedName};

/// Disambiguates a comparison where names alone are not enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UpgradeHint {
    /// `from` in the old catalog is `to` in the new one.
    ///
    /// For tables a different schema component makes it a move.
    Rename {
        /// Path in the old catalog.
        from: NodePath,
        /// Path in the new catalog.
        to: NodePath,
    },
    /// The node at `path` is removed on purpose; its data may be lost.
    Remove {
        /// Path in the old catalog.
        path: NodePath,
    },
}

impl UpgradeHint {
    /// Rename hint from dotted paths.
    pub fn rename(from: &str, to: &str) -> Result<Self> {
        Ok(Self::Rename {
            from: from.parse()?,
            to: to.parse()?,
        })
    }

    /// Remove hint from a dotted path.
    pub fn remove(path: &str) -> Result<Self> {
        Ok(Self::Remove {
            path: path.parse()?,
        })
    }
}

/// Hints checked against both catalogs and indexed for matching.
#[derive(Debug, Default)]
pub(crate) struct HintSet {
    /// New table name to old table name.
    tables: BTreeMap<QualifiedName, QualifiedName>,
    /// (old table, new table) to new column name to old column name.
    columns: BTreeMap<(QualifiedName, QualifiedName), BTreeMap<String, String>>,
    removals: BTreeSet<NodePath>,
}

impl HintSet {
    pub(crate) fn resolve(hints: &[UpgradeHint], old: &Catalog, new: &Catalog) -> Result<Self> {
        let mut set = Self::default();
        for hint in hints {
            match hint {
                UpgradeHint::Rename { from, to } => {
                    require(old, from, "old")?;
                    require(new, to, "new")?;
                    match (from.depth(), to.depth(), from.table_name(), to.table_name()) {
                        (2, 2, Some(from_table), Some(to_table)) => {
                            if set.tables.insert(to_table, from_table).is_some() {
                                return Err(UpgradeError::InvalidHint(format!(
                                    "{to} is the target of two renames"
                                )));
                            }
                        }
                        (3, 3, Some(from_table), Some(to_table)) => {
                            if let (Some(old_column), Some(new_column)) = (&from.column, &to.column)
                            {
                                set.columns
                                    .entry((from_table, to_table))
                                    .or_default()
                                    .insert(new_column.clone(), old_column.clone());
                            }
                        }
                        _ => {
                            return Err(UpgradeError::InvalidHint(format!(
                                "cannot rename {from} to {to}: only tables and columns are renamed"
                            )));
                        }
                    }
                }
                UpgradeHint::Remove { path } => {
                    require(old, path, "old")?;
                    set.removals.insert(path.clone());
                }
            }
        }
        Ok(set)
    }

    /// Old name of a new table, when a hint renamed it.
    pub(crate) fn renamed_table(&self, new: &QualifiedName) -> Option<&QualifiedName> {
        self.tables.get(new)
    }

    /// Whether a hint claims this old table as a rename source.
    pub(crate) fn is_rename_source(&self, old: &QualifiedName) -> bool {
        self.tables.values().any(|source| source == old)
    }

    /// Old name of a new column, when a hint renamed it.
    pub(crate) fn renamed_column(
        &self,
        old_table: &QualifiedName,
        new_table: &QualifiedName,
        column: &str,
    ) -> Option<&str> {
        self.columns
            .get(&(old_table.clone(), new_table.clone()))
            .and_then(|columns| columns.get(column))
            .map(String::as_str)
    }

    /// Whether a column is claimed as a rename source within a table pair.
    pub(crate) fn is_column_rename_source(
        &self,
        old_table: &QualifiedName,
        new_table: &QualifiedName,
        column: &str,
    ) -> bool {
        self.columns
            .get(&(old_table.clone(), new_table.clone()))
            .is_some_and(|columns| columns.values().any(|source| source == column))
    }

    /// Whether data loss at `path` (or any parent) was acknowledged.
    pub(crate) fn is_removal_acknowledged(&self, path: &NodePath) -> bool {
        let table = NodePath {
            column: None,
            ..path.clone()
        };
        let schema = NodePath::schema(path.schema.as_str());
        self.removals.contains(path)
            || self.removals.contains(&table)
            || self.removals.contains(&schema)
    }
}

fn require(catalog: &Catalog, path: &NodePath, side: &str) -> Result<()> {
    let exists = match (path.table_name(), &path.column) {
        (None, _) => catalog.schema(&path.schema).is_some(),
        (Some(table), None) => catalog.table(&table).is_some(),
        (Some(table), Some(column)) => catalog
            .table(&table)
            .is_some_and(|t| t.column(column).is_some()),
    };
    if exists {
        Ok(())
    } else {
        Err(UpgradeError::InvalidHint(format!(
            "{path} does not exist in the {side} catalog"
        )))
    }
}
