//! Structural comparison of two catalogs.
//!
//! Nodes are matched by rename hints first, then by equal names; whatever
//! is left over is an addition or a removal. The result is a tree: catalog,
//! then tables, then the columns, indexes and constraints of each table.

use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::Serialize;

use super::error::Result;
use super::hint::{HintSet, UpgradeHint};
use crate::model::{
    Catalog, CharacterSet, Collation, Constraint, Index, Named, NodeCollection, PartitionFunction,
    QualifiedName, Schema, Sequence, Table, TableColumn, View,
};

/// A property whose value differs between the two sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyChange {
    /// Property name.
    pub property: &'static str,
    /// Rendered old value.
    pub old: String,
    /// Rendered new value.
    pub new: String,
}

impl PropertyChange {
    fn new(property: &'static str, old: impl ToString, new: impl ToString) -> Self {
        Self {
            property,
            old: old.to_string(),
            new: new.to_string(),
        }
    }

    fn debug(property: &'static str, old: &impl Debug, new: &impl Debug) -> Self {
        Self::new(property, format!("{old:?}"), format!("{new:?}"))
    }
}

/// Difference of one named node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDiff<T> {
    /// The node in the old catalog.
    pub old: Option<T>,
    /// The node in the new catalog.
    pub new: Option<T>,
    /// Changed properties of a matched node.
    pub properties: Vec<PropertyChange>,
}

impl<T: Named> NodeDiff<T> {
    const fn added(new: T) -> Self {
        Self {
            old: None,
            new: Some(new),
            properties: Vec::new(),
        }
    }

    const fn removed(old: T) -> Self {
        Self {
            old: Some(old),
            new: None,
            properties: Vec::new(),
        }
    }

    /// Present only in the new catalog.
    #[must_use]
    pub const fn is_added(&self) -> bool {
        self.old.is_none()
    }

    /// Present only in the old catalog.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.new.is_none()
    }

    /// Matched under a different name.
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        matches!((&self.old, &self.new), (Some(old), Some(new)) if old.name() != new.name())
    }

    /// Matched with changed properties.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.properties.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.old.is_some() && self.new.is_some() && !self.is_renamed() && !self.is_changed()
    }
}

/// A schema-level node difference together with its schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scoped<T> {
    /// Owning schema.
    pub schema: String,
    /// The difference.
    #[serde(flatten)]
    pub diff: NodeDiff<T>,
}

/// Difference of one table, with its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDiff {
    /// Name in the old catalog.
    pub old_name: Option<QualifiedName>,
    /// Name in the new catalog.
    pub new_name: Option<QualifiedName>,
    /// The table in the old catalog.
    pub old: Option<Table>,
    /// The table in the new catalog.
    pub new: Option<Table>,
    /// Table-level property changes.
    pub properties: Vec<PropertyChange>,
    /// Column differences.
    pub columns: Vec<NodeDiff<TableColumn>>,
    /// Index differences.
    pub indexes: Vec<NodeDiff<Index>>,
    /// Constraint differences.
    pub constraints: Vec<NodeDiff<Constraint>>,
}

impl TableDiff {
    /// Present only in the new catalog.
    #[must_use]
    pub const fn is_added(&self) -> bool {
        self.old.is_none()
    }

    /// Present only in the old catalog.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.new.is_none()
    }

    /// Matched in another schema.
    #[must_use]
    pub fn is_moved(&self) -> bool {
        matches!((&self.old_name, &self.new_name), (Some(o), Some(n)) if o.schema != n.schema)
    }

    /// Matched under another name.
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        matches!((&self.old_name, &self.new_name), (Some(o), Some(n)) if o.name != n.name)
    }

    fn is_empty(&self) -> bool {
        self.old.is_some()
            && self.new.is_some()
            && !self.is_moved()
            && !self.is_renamed()
            && self.properties.is_empty()
            && self.columns.is_empty()
            && self.indexes.is_empty()
            && self.constraints.is_empty()
    }
}

/// Difference of two catalogs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogDiff {
    /// Schemas only in the new catalog.
    pub added_schemas: Vec<String>,
    /// Schemas only in the old catalog.
    pub removed_schemas: Vec<String>,
    /// Table differences.
    pub tables: Vec<TableDiff>,
    /// View differences.
    pub views: Vec<Scoped<View>>,
    /// Sequence differences.
    pub sequences: Vec<Scoped<Sequence>>,
    /// Character set differences.
    pub character_sets: Vec<Scoped<CharacterSet>>,
    /// Collation differences.
    pub collations: Vec<Scoped<Collation>>,
    /// Partition function differences.
    pub partition_functions: Vec<Scoped<PartitionFunction>>,
}

impl CatalogDiff {
    /// Returns true when both catalogs are structurally equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_schemas.is_empty()
            && self.removed_schemas.is_empty()
            && self.tables.is_empty()
            && self.views.is_empty()
            && self.sequences.is_empty()
            && self.character_sets.is_empty()
            && self.collations.is_empty()
            && self.partition_functions.is_empty()
    }
}

/// Compares `old` against `new` under the given hints.
pub fn compare(old: &Catalog, new: &Catalog, hints: &[UpgradeHint]) -> Result<CatalogDiff> {
    let hints = HintSet::resolve(hints, old, new)?;
    Ok(compare_with(old, new, &hints))
}

pub(crate) fn compare_with(old: &Catalog, new: &Catalog, hints: &HintSet) -> CatalogDiff {
    let old_schemas: BTreeSet<&str> = old.schemas().names().collect();
    let new_schemas: BTreeSet<&str> = new.schemas().names().collect();

    let mut diff = CatalogDiff {
        added_schemas: new
            .schemas()
            .names()
            .filter(|name| !old_schemas.contains(name))
            .map(str::to_string)
            .collect(),
        removed_schemas: old
            .schemas()
            .names()
            .filter(|name| !new_schemas.contains(name))
            .map(str::to_string)
            .collect(),
        tables: compare_tables(old, new, hints),
        ..CatalogDiff::default()
    };

    let empty = Schema::new("");
    let schema_names = old_schemas.union(&new_schemas);
    for name in schema_names {
        let old_schema = old.schema(name).unwrap_or(&empty);
        let new_schema = new.schema(name).unwrap_or(&empty);
        scoped(name, old_schema.views(), new_schema.views(), &mut diff.views, |o, n| {
            let mut changes = Vec::new();
            if o.definition != n.definition {
                changes.push(PropertyChange::debug("definition", &o.definition, &n.definition));
            }
            changes
        });
        scoped(
            name,
            old_schema.sequences(),
            new_schema.sequences(),
            &mut diff.sequences,
            |o, n| {
                let mut changes = Vec::new();
                if o.descriptor != n.descriptor {
                    changes.push(PropertyChange::debug("descriptor", &o.descriptor, &n.descriptor));
                }
                if o.data_type != n.data_type {
                    changes.push(PropertyChange::debug("data_type", &o.data_type, &n.data_type));
                }
                changes
            },
        );
        scoped(
            name,
            old_schema.character_sets(),
            new_schema.character_sets(),
            &mut diff.character_sets,
            |o, n| whole("definition", o, n),
        );
        scoped(
            name,
            old_schema.collations(),
            new_schema.collations(),
            &mut diff.collations,
            |o, n| whole("definition", o, n),
        );
        scoped(
            name,
            old_schema.partition_functions(),
            new_schema.partition_functions(),
            &mut diff.partition_functions,
            |o, n| whole("definition", o, n),
        );
    }
    diff
}

fn whole<T: PartialEq + Debug>(property: &'static str, old: &T, new: &T) -> Vec<PropertyChange> {
    if old == new {
        Vec::new()
    } else {
        vec![PropertyChange::debug(property, old, new)]
    }
}

/// Name-matched comparison of one schema-level collection.
fn scoped<T: Named + Clone>(
    schema: &str,
    old: &NodeCollection<T>,
    new: &NodeCollection<T>,
    out: &mut Vec<Scoped<T>>,
    properties: impl Fn(&T, &T) -> Vec<PropertyChange>,
) {
    for diff in by_name(old, new, properties) {
        out.push(Scoped {
            schema: schema.to_string(),
            diff,
        });
    }
}

/// Matches two collections by name; drops unchanged pairs.
fn by_name<T: Named + Clone>(
    old: &NodeCollection<T>,
    new: &NodeCollection<T>,
    properties: impl Fn(&T, &T) -> Vec<PropertyChange>,
) -> Vec<NodeDiff<T>> {
    let mut diffs: Vec<NodeDiff<T>> = old
        .iter()
        .filter(|node| !new.contains(node.name()))
        .cloned()
        .map(NodeDiff::removed)
        .collect();
    for node in new.iter() {
        let diff = match old.get(node.name()) {
            Some(previous) => NodeDiff {
                properties: properties(previous, node),
                old: Some(previous.clone()),
                new: Some(node.clone()),
            },
            None => NodeDiff::added(node.clone()),
        };
        if !diff.is_empty() {
            diffs.push(diff);
        }
    }
    diffs
}

fn compare_tables(old: &Catalog, new: &Catalog, hints: &HintSet) -> Vec<TableDiff> {
    let mut matched_old = BTreeSet::new();
    let mut diffs = Vec::new();

    for (new_name, new_table) in new.all_tables() {
        let source = match hints.renamed_table(&new_name) {
            Some(source) => Some(source.clone()),
            None if !hints.is_rename_source(&new_name) && old.table(&new_name).is_some() => {
                Some(new_name.clone())
            }
            None => None,
        };
        let diff = match source.and_then(|name| old.table(&name).map(|t| (name, t))) {
            Some((old_name, old_table)) => {
                matched_old.insert(old_name.clone());
                compare_table(old_name, old_table, new_name, new_table, hints)
            }
            None => TableDiff {
                old_name: None,
                new_name: Some(new_name),
                old: None,
                new: Some(new_table.clone()),
                properties: Vec::new(),
                columns: Vec::new(),
                indexes: Vec::new(),
                constraints: Vec::new(),
            },
        };
        if !diff.is_empty() {
            diffs.push(diff);
        }
    }

    for (old_name, old_table) in old.all_tables() {
        if !matched_old.contains(&old_name) {
            diffs.push(TableDiff {
                old_name: Some(old_name),
                new_name: None,
                old: Some(old_table.clone()),
                new: None,
                properties: Vec::new(),
                columns: Vec::new(),
                indexes: Vec::new(),
                constraints: Vec::new(),
            });
        }
    }
    diffs
}

fn compare_table(
    old_name: QualifiedName,
    old: &Table,
    new_name: QualifiedName,
    new: &Table,
    hints: &HintSet,
) -> TableDiff {
    let mut properties = Vec::new();
    if old.kind != new.kind {
        properties.push(PropertyChange::debug("kind", &old.kind, &new.kind));
    }
    TableDiff {
        columns: compare_columns(&old_name, old, &new_name, new, hints),
        indexes: by_name(old.indexes(), new.indexes(), |o, n| whole("definition", o, n)),
        constraints: compare_constraints(old, new),
        old_name: Some(old_name),
        new_name: Some(new_name),
        old: Some(old.clone()),
        new: Some(new.clone()),
        properties,
    }
}

/// Constraints match by name, then by body: catalogs such as SQLite
/// synthesize key names, so a renamed but otherwise equal key is unchanged.
fn compare_constraints(old: &Table, new: &Table) -> Vec<NodeDiff<Constraint>> {
    let diffs = by_name(old.constraints(), new.constraints(), |o, n| {
        whole("definition", o, n)
    });
    let (mut removed, rest): (Vec<_>, Vec<_>) = diffs.into_iter().partition(NodeDiff::is_removed);
    let (mut added, mut changed): (Vec<_>, Vec<_>) = rest.into_iter().partition(NodeDiff::is_added);
    removed.retain(|diff| {
        let Some(old) = &diff.old else {
            return true;
        };
        let twin = added
            .iter()
            .position(|a| a.new.as_ref().is_some_and(|new| same_body(old, new)));
        twin.map(|index| added.remove(index)).is_none()
    });
    changed.extend(removed);
    changed.extend(added);
    changed
}

fn same_body(old: &Constraint, new: &Constraint) -> bool {
    old.kind == new.kind
        && old.is_deferrable == new.is_deferrable
        && old.is_initially_deferred == new.is_initially_deferred
}

fn compare_columns(
    old_name: &QualifiedName,
    old: &Table,
    new_name: &QualifiedName,
    new: &Table,
    hints: &HintSet,
) -> Vec<NodeDiff<TableColumn>> {
    let mut matched_old = BTreeSet::new();
    let mut diffs = Vec::new();

    for column in new.columns() {
        let source = hints
            .renamed_column(old_name, new_name, column.name())
            .or_else(|| {
                let claimed = hints.is_column_rename_source(old_name, new_name, column.name());
                (!claimed).then_some(column.name())
            })
            .and_then(|name| old.column(name));
        let diff = match source {
            Some(previous) => {
                matched_old.insert(previous.name().to_string());
                NodeDiff {
                    properties: column_properties(previous, column),
                    old: Some(previous.clone()),
                    new: Some(column.clone()),
                }
            }
            None => NodeDiff::added(column.clone()),
        };
        if !diff.is_empty() {
            diffs.push(diff);
        }
    }
    for column in old.columns() {
        if !matched_old.contains(column.name()) {
            diffs.push(NodeDiff::removed(column.clone()));
        }
    }
    diffs
}

fn column_properties(old: &TableColumn, new: &TableColumn) -> Vec<PropertyChange> {
    let mut changes = Vec::new();
    if old.data_type != new.data_type {
        changes.push(PropertyChange::new("data_type", &old.data_type, &new.data_type));
    }
    if old.is_nullable != new.is_nullable {
        changes.push(PropertyChange::new("is_nullable", old.is_nullable, new.is_nullable));
    }
    if old.default_value != new.default_value {
        changes.push(PropertyChange::debug(
            "default_value",
            &old.default_value,
            &new.default_value,
        ));
    }
    if old.collation != new.collation {
        changes.push(PropertyChange::debug("collation", &old.collation, &new.collation));
    }
    if old.identity != new.identity {
        changes.push(PropertyChange::debug("identity", &old.identity, &new.identity));
    }
    changes
}
