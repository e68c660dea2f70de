//! Turns a catalog difference into ordered DDL.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::compare::{compare_with, CatalogDiff, NodeDiff, Scoped, TableDiff};
use super::error::{Result, UpgradeError};
use super::hint::{HintSet, UpgradeHint};
use super::ignore::{IgnoreRule, IgnoreRules};
use super::path::NodePath;
use super::validate::{UnsafeReason, ValidationReport};
use crate::ast::{ColumnChange, SqlAlterAction, SqlDdl};
use crate::compiler::{CompiledCommand, SqlCompiler};
use crate::dialect::Dialect;
use crate::model::{
    Catalog, Constraint, Named, QualifiedName, Sequence, SequenceDescriptor, Table, TableColumn,
    View,
};

/// How unsafe changes are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeMode {
    /// Plan everything; unsafe changes are logged as warnings.
    Perform,
    /// Refuse to plan while any unsafe change lacks a removal hint.
    #[default]
    PerformSafely,
}

/// Execution stage of an action. Actions run in stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeStage {
    DropForeignKeys,
    DropViews,
    DropIndexes,
    DropConstraints,
    /// Character sets, collations and partition functions that change.
    DropReplaced,
    RenameTables,
    RenameColumns,
    CreateSchemas,
    CreateCharacterSets,
    CreateCollations,
    CreatePartitionFunctions,
    CreateSequences,
    AlterSequences,
    DropTables,
    CreateTables,
    AddColumns,
    AlterColumns,
    DropColumns,
    CreateConstraints,
    CreateIndexes,
    CreateForeignKeys,
    CreateViews,
    DropSequences,
    DropPartitionFunctions,
    DropCollations,
    DropCharacterSets,
    DropSchemas,
}

/// One planned statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeAction {
    /// Stage the statement belongs to.
    pub stage: UpgradeStage,
    /// The statement.
    pub statement: SqlDdl,
}

/// The result of planning: ordered actions, findings and the underlying
/// difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradePlan {
    actions: Vec<UpgradeAction>,
    report: ValidationReport,
    diff: CatalogDiff,
}

impl UpgradePlan {
    /// Actions in execution order.
    #[must_use]
    pub fn actions(&self) -> &[UpgradeAction] {
        &self.actions
    }

    /// Statements in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &SqlDdl> {
        self.actions.iter().map(|action| &action.statement)
    }

    /// Unsafe findings that were accepted in [`UpgradeMode::Perform`].
    #[must_use]
    pub const fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// The structural difference the plan was built from.
    #[must_use]
    pub const fn diff(&self) -> &CatalogDiff {
        &self.diff
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Compiles every action for `dialect`, failing on the first construct
    /// the dialect cannot render.
    pub fn compile(&self, dialect: &dyn Dialect) -> Result<Vec<CompiledCommand>> {
        let compiler = SqlCompiler::new(dialect);
        self.statements()
            .map(|statement| compiler.compile_ddl(statement).map_err(UpgradeError::from))
            .collect()
    }
}

/// Plans the upgrade of one catalog into another.
///
/// ```rust
/// use oxide_sql_core::model::{Catalog, SqlType};
/// use oxide_sql_core::upgrade::{UpgradeMode, UpgradePlanner};
///
/// let old = Catalog::new("shop");
/// let mut new = Catalog::new("shop");
/// let main = new.create_schema("main").unwrap();
/// main.create_table("orders").unwrap().create_column("id", SqlType::Int32).unwrap();
///
/// let plan = UpgradePlanner::new()
///     .mode(UpgradeMode::Perform)
///     .plan(&old, &new)
///     .unwrap();
/// assert_eq!(plan.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct UpgradePlanner {
    mode: UpgradeMode,
    ignore: Vec<IgnoreRule>,
    hints: Vec<UpgradeHint>,
    inline_foreign_keys: bool,
}

impl UpgradePlanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the upgrade mode.
    #[must_use]
    pub const fn mode(mut self, mode: UpgradeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Adds an ignore rule.
    #[must_use]
    pub fn ignore(mut self, rule: IgnoreRule) -> Self {
        self.ignore.push(rule);
        self
    }

    /// Adds several ignore rules.
    #[must_use]
    pub fn ignore_all(mut self, rules: impl IntoIterator<Item = IgnoreRule>) -> Self {
        self.ignore.extend(rules);
        self
    }

    /// Adds a hint.
    #[must_use]
    pub fn hint(mut self, hint: UpgradeHint) -> Self {
        self.hints.push(hint);
        self
    }

    /// Adds several hints.
    #[must_use]
    pub fn hints(mut self, hints: impl IntoIterator<Item = UpgradeHint>) -> Self {
        self.hints.extend(hints);
        self
    }

    /// Keeps foreign keys inside `CREATE TABLE` for new tables, for
    /// dialects that cannot add constraints later.
    #[must_use]
    pub const fn inline_foreign_keys(mut self, inline: bool) -> Self {
        self.inline_foreign_keys = inline;
        self
    }

    /// Compares `old` against `new` and orders the resulting actions.
    pub fn plan(&self, old: &Catalog, new: &Catalog) -> Result<UpgradePlan> {
        let mut old = old.clone();
        let mut new = new.clone();
        let rules = IgnoreRules::new(&self.ignore)?;
        if !rules.is_empty() {
            rules.apply(&mut old);
            rules.apply(&mut new);
        }

        let hints = HintSet::resolve(&self.hints, &old, &new)?;
        let diff = compare_with(&old, &new, &hints);

        let mut builder = PlanBuilder {
            old: &old,
            new: &new,
            hints: &hints,
            inline_foreign_keys: self.inline_foreign_keys,
            actions: Vec::new(),
            report: ValidationReport::default(),
        };
        builder.build(&diff);
        let PlanBuilder {
            mut actions,
            report,
            ..
        } = builder;

        if !report.is_empty() {
            match self.mode {
                UpgradeMode::PerformSafely => return Err(UpgradeError::UnsafeUpgrade(report)),
                UpgradeMode::Perform => {
                    for issue in report.issues() {
                        warn!(path = %issue.path, "Unsafe upgrade action: {}", issue.reason);
                    }
                }
            }
        }

        actions.sort_by_key(|action| action.stage);
        info!(actions = actions.len(), "Planned upgrade");
        Ok(UpgradePlan {
            actions,
            report,
            diff,
        })
    }
}

struct PlanBuilder<'h> {
    old: &'h Catalog,
    new: &'h Catalog,
    hints: &'h HintSet,
    inline_foreign_keys: bool,
    actions: Vec<UpgradeAction>,
    report: ValidationReport,
}

impl PlanBuilder<'_> {
    fn push(&mut self, stage: UpgradeStage, statement: SqlDdl) {
        debug!(stage = ?stage, action = statement.label(), "Planned action");
        self.actions.push(UpgradeAction { stage, statement });
    }

    fn flag(&mut self, path: NodePath, reason: UnsafeReason) {
        if !self.hints.is_removal_acknowledged(&path) {
            self.report.push(path, reason);
        }
    }

    fn build(&mut self, diff: &CatalogDiff) {
        for schema in &diff.added_schemas {
            self.push(
                UpgradeStage::CreateSchemas,
                SqlDdl::CreateSchema {
                    name: schema.clone(),
                },
            );
        }

        let mut dropped = Vec::new();
        let mut created = Vec::new();
        let mut recreated = Vec::new();
        for table in &diff.tables {
            match (&table.old_name, &table.old, &table.new_name, &table.new) {
                (Some(name), Some(old), None, None) => {
                    self.flag(NodePath::table(name), UnsafeReason::DropTable);
                    dropped.push((name.clone(), old));
                }
                (None, None, Some(name), Some(new)) => created.push((name.clone(), new)),
                (Some(old_name), Some(old), Some(new_name), Some(new)) => {
                    if old.kind == new.kind {
                        self.alter_table(table, old_name, new_name);
                    } else {
                        self.flag(NodePath::table(old_name), UnsafeReason::TableKindChange);
                        dropped.push((old_name.clone(), old));
                        created.push((new_name.clone(), new));
                        recreated.push((old_name.clone(), new_name.clone()));
                    }
                }
                _ => {}
            }
        }
        self.drop_tables(dropped);
        self.create_tables(created);
        if !self.inline_foreign_keys {
            self.reattach_foreign_keys(diff, &recreated);
        }

        for view in &diff.views {
            self.view(view);
        }
        self.rebuild_dependent_views(diff, &reshaped_tables(diff));
        for sequence in &diff.sequences {
            self.sequence(sequence);
        }
        self.small_objects(diff);

        for schema in &diff.removed_schemas {
            self.push(
                UpgradeStage::DropSchemas,
                SqlDdl::DropSchema {
                    name: schema.clone(),
                    cascade: false,
                },
            );
        }
    }

    /// Drops referencing tables before the tables they reference.
    fn drop_tables(&mut self, tables: Vec<(QualifiedName, &Table)>) {
        let mut ordered = dependency_order(tables);
        ordered.reverse();
        for (name, _) in ordered {
            self.push(
                UpgradeStage::DropTables,
                SqlDdl::DropTable {
                    table: name,
                    cascade: false,
                },
            );
        }
    }

    /// Creates referenced tables before the tables referencing them.
    fn create_tables(&mut self, tables: Vec<(QualifiedName, &Table)>) {
        for (name, table) in dependency_order(tables) {
            let mut definition = table.clone();
            for index in table.indexes() {
                definition.remove_index(index.name());
                self.push(
                    UpgradeStage::CreateIndexes,
                    SqlDdl::CreateIndex {
                        table: name.clone(),
                        index: index.clone(),
                    },
                );
            }
            if !self.inline_foreign_keys {
                for (constraint, _) in table.foreign_keys() {
                    definition.remove_constraint(constraint.name());
                    self.push(
                        UpgradeStage::CreateForeignKeys,
                        SqlDdl::alter(
                            name.clone(),
                            SqlAlterAction::AddConstraint(constraint.clone()),
                        ),
                    );
                }
            }
            self.push(
                UpgradeStage::CreateTables,
                SqlDdl::CreateTable {
                    schema: name.schema.clone(),
                    table: definition,
                },
            );
        }
    }

    /// Foreign keys of surviving tables that point at a recreated table are
    /// dropped before it goes and added back once it exists again.
    fn reattach_foreign_keys(
        &mut self,
        diff: &CatalogDiff,
        recreated: &[(QualifiedName, QualifiedName)],
    ) {
        if recreated.is_empty() {
            return;
        }
        let (old, new) = (self.old, self.new);
        for (old_name, table) in old.all_tables() {
            let matched = diff
                .tables
                .iter()
                .find(|t| t.old_name.as_ref() == Some(&old_name));
            let (new_name, changed) = match matched {
                None => (old_name.clone(), &[][..]),
                Some(t) => match (&t.old, &t.new, &t.new_name) {
                    (Some(o), Some(n), Some(name)) if o.kind == n.kind => {
                        (name.clone(), t.constraints.as_slice())
                    }
                    _ => continue,
                },
            };
            let Some(current) = new.table(&new_name) else {
                continue;
            };

            for (constraint, fk) in table.foreign_keys() {
                let targeted = recreated.iter().any(|(o, _)| *o == fk.referenced_table);
                let handled = changed
                    .iter()
                    .any(|d| d.old.as_ref().is_some_and(|c| c.name() == constraint.name()));
                if targeted && !handled {
                    self.push(
                        UpgradeStage::DropForeignKeys,
                        SqlDdl::alter(
                            old_name.clone(),
                            SqlAlterAction::DropConstraint {
                                name: constraint.name().to_string(),
                                cascade: false,
                            },
                        ),
                    );
                }
            }
            for (constraint, fk) in current.foreign_keys() {
                let targeted = recreated.iter().any(|(_, n)| *n == fk.referenced_table);
                let handled = changed
                    .iter()
                    .any(|d| d.new.as_ref().is_some_and(|c| c.name() == constraint.name()));
                if targeted && !handled {
                    self.push(
                        UpgradeStage::CreateForeignKeys,
                        SqlDdl::alter(
                            new_name.clone(),
                            SqlAlterAction::AddConstraint(constraint.clone()),
                        ),
                    );
                }
            }
        }
    }

    /// Views the comparison left alone that read a reshaped table are
    /// dropped first and created again at the end.
    fn rebuild_dependent_views(&mut self, diff: &CatalogDiff, reshaped: &[QualifiedName]) {
        if reshaped.is_empty() {
            return;
        }
        let (old, new) = (self.old, self.new);
        for schema in old.schemas() {
            for view in schema.views() {
                let compared = diff.views.iter().any(|d| {
                    d.schema == schema.name()
                        && d.diff.old.as_ref().is_some_and(|o| o.name() == view.name())
                });
                if compared || !reshaped.iter().any(|table| view.depends_on(table)) {
                    continue;
                }
                let Some(target) = new.schema(schema.name()).and_then(|s| s.view(view.name()))
                else {
                    continue;
                };
                self.push(
                    UpgradeStage::DropViews,
                    SqlDdl::DropView {
                        view: schema.qualify(view.name()),
                    },
                );
                self.push(
                    UpgradeStage::CreateViews,
                    SqlDdl::CreateView {
                        schema: schema.name().to_string(),
                        view: target.clone(),
                    },
                );
            }
        }
    }

    fn alter_table(
        &mut self,
        diff: &TableDiff,
        old_name: &QualifiedName,
        new_name: &QualifiedName,
    ) {
        let mut current = old_name.clone();
        if diff.is_moved() {
            self.push(
                UpgradeStage::RenameTables,
                SqlDdl::MoveTable {
                    table: current.clone(),
                    new_schema: new_name.schema.clone(),
                },
            );
            current.schema.clone_from(&new_name.schema);
        }
        if diff.is_renamed() {
            self.push(
                UpgradeStage::RenameTables,
                SqlDdl::RenameTable {
                    table: current,
                    new_name: new_name.name.clone(),
                },
            );
        }

        for column in &diff.columns {
            self.column(column, old_name, new_name);
        }

        for index in &diff.indexes {
            if let Some(old) = &index.old {
                self.push(
                    UpgradeStage::DropIndexes,
                    SqlDdl::DropIndex {
                        table: old_name.clone(),
                        name: old.name().to_string(),
                    },
                );
            }
            if let Some(new) = &index.new {
                self.push(
                    UpgradeStage::CreateIndexes,
                    SqlDdl::CreateIndex {
                        table: new_name.clone(),
                        index: new.clone(),
                    },
                );
            }
        }

        for constraint in &diff.constraints {
            if let Some(old) = &constraint.old {
                let stage = if is_foreign_key(old) {
                    UpgradeStage::DropForeignKeys
                } else {
                    UpgradeStage::DropConstraints
                };
                self.push(
                    stage,
                    SqlDdl::alter(
                        old_name.clone(),
                        SqlAlterAction::DropConstraint {
                            name: old.name().to_string(),
                            cascade: false,
                        },
                    ),
                );
            }
            if let Some(new) = &constraint.new {
                let stage = if is_foreign_key(new) {
                    UpgradeStage::CreateForeignKeys
                } else {
                    UpgradeStage::CreateConstraints
                };
                self.push(
                    stage,
                    SqlDdl::alter(new_name.clone(), SqlAlterAction::AddConstraint(new.clone())),
                );
            }
        }
    }

    fn column(
        &mut self,
        diff: &NodeDiff<TableColumn>,
        old_table: &QualifiedName,
        new_table: &QualifiedName,
    ) {
        match (&diff.old, &diff.new) {
            (None, Some(new)) => {
                if !new.is_nullable && new.default_value.is_none() && new.identity.is_none() {
                    self.flag(
                        NodePath::column(new_table, new.name()),
                        UnsafeReason::NotNullWithoutDefault,
                    );
                }
                self.push(
                    UpgradeStage::AddColumns,
                    SqlDdl::alter(new_table.clone(), SqlAlterAction::AddColumn(new.clone())),
                );
            }
            (Some(old), None) => {
                self.flag(
                    NodePath::column(old_table, old.name()),
                    UnsafeReason::DropColumn,
                );
                self.push(
                    UpgradeStage::DropColumns,
                    SqlDdl::alter(
                        new_table.clone(),
                        SqlAlterAction::DropColumn {
                            column: old.name().to_string(),
                            cascade: false,
                        },
                    ),
                );
            }
            (Some(old), Some(new)) => {
                if old.name() != new.name() {
                    self.push(
                        UpgradeStage::RenameColumns,
                        SqlDdl::alter(
                            new_table.clone(),
                            SqlAlterAction::RenameColumn {
                                column: old.name().to_string(),
                                new_name: new.name().to_string(),
                            },
                        ),
                    );
                }
                self.alter_column(old, new, old_table, new_table);
            }
            (None, None) => {}
        }
    }

    /// Type first, then default, then nullability, so a column can gain a
    /// default in the same plan that makes it NOT NULL.
    fn alter_column(
        &mut self,
        old: &TableColumn,
        new: &TableColumn,
        old_table: &QualifiedName,
        new_table: &QualifiedName,
    ) {
        let path = NodePath::column(old_table, old.name());
        let mut changes = Vec::new();

        if old.data_type != new.data_type {
            if !old.data_type.converts_safely_to(&new.data_type) {
                self.flag(
                    path.clone(),
                    UnsafeReason::NarrowingType {
                        old: old.data_type.clone(),
                        new: new.data_type.clone(),
                    },
                );
            }
            changes.push(ColumnChange::DataType(new.data_type.clone()));
        }
        if old.default_value != new.default_value {
            changes.push(if new.default_value.is_some() {
                ColumnChange::SetDefault
            } else {
                ColumnChange::DropDefault
            });
        }
        if old.is_nullable != new.is_nullable {
            if !new.is_nullable && new.default_value.is_none() {
                self.flag(path.clone(), UnsafeReason::NotNullWithoutDefault);
            }
            changes.push(ColumnChange::Nullability(new.is_nullable));
        }
        if old.collation != new.collation {
            self.flag(
                path.clone(),
                UnsafeReason::Unrepresentable {
                    property: "collation".to_string(),
                },
            );
        }
        if old.identity != new.identity {
            self.flag(
                path,
                UnsafeReason::Unrepresentable {
                    property: "identity".to_string(),
                },
            );
        }

        for change in changes {
            self.push(
                UpgradeStage::AlterColumns,
                SqlDdl::alter(
                    new_table.clone(),
                    SqlAlterAction::AlterColumn {
                        column: new.clone(),
                        change,
                    },
                ),
            );
        }
    }

    fn view(&mut self, view: &Scoped<View>) {
        if let Some(old) = &view.diff.old {
            self.push(
                UpgradeStage::DropViews,
                SqlDdl::DropView {
                    view: QualifiedName::new(view.schema.as_str(), old.name()),
                },
            );
        }
        if let Some(new) = &view.diff.new {
            self.push(
                UpgradeStage::CreateViews,
                SqlDdl::CreateView {
                    schema: view.schema.clone(),
                    view: new.clone(),
                },
            );
        }
    }

    fn sequence(&mut self, sequence: &Scoped<Sequence>) {
        let schema = sequence.schema.as_str();
        match (&sequence.diff.old, &sequence.diff.new) {
            (None, Some(new)) => self.push(
                UpgradeStage::CreateSequences,
                SqlDdl::CreateSequence {
                    schema: schema.to_string(),
                    sequence: new.clone(),
                },
            ),
            (Some(old), None) => self.push(
                UpgradeStage::DropSequences,
                SqlDdl::DropSequence {
                    sequence: QualifiedName::new(schema, old.name()),
                },
            ),
            (Some(old), Some(new)) => {
                let name = QualifiedName::new(schema, new.name());
                if old.data_type != new.data_type {
                    self.flag(
                        NodePath::table(&name),
                        UnsafeReason::Unrepresentable {
                            property: "sequence data type".to_string(),
                        },
                    );
                }
                let descriptor = changed_settings(&old.descriptor, &new.descriptor);
                if descriptor != SequenceDescriptor::default() {
                    self.push(
                        UpgradeStage::AlterSequences,
                        SqlDdl::AlterSequence {
                            sequence: name,
                            descriptor,
                        },
                    );
                }
            }
            (None, None) => {}
        }
    }

    /// Character sets, collations and partition functions are replaced
    /// rather than altered.
    fn small_objects(&mut self, diff: &CatalogDiff) {
        for item in &diff.character_sets {
            let schema = item.schema.as_str();
            if let Some(old) = &item.diff.old {
                let stage = if item.diff.new.is_some() {
                    UpgradeStage::DropReplaced
                } else {
                    UpgradeStage::DropCharacterSets
                };
                self.push(
                    stage,
                    SqlDdl::DropCharacterSet {
                        name: QualifiedName::new(schema, old.name()),
                    },
                );
            }
            if let Some(new) = &item.diff.new {
                self.push(
                    UpgradeStage::CreateCharacterSets,
                    SqlDdl::CreateCharacterSet {
                        schema: schema.to_string(),
                        character_set: new.clone(),
                    },
                );
            }
        }
        for item in &diff.collations {
            let schema = item.schema.as_str();
            if let Some(old) = &item.diff.old {
                let stage = if item.diff.new.is_some() {
                    UpgradeStage::DropReplaced
                } else {
                    UpgradeStage::DropCollations
                };
                self.push(
                    stage,
                    SqlDdl::DropCollation {
                        name: QualifiedName::new(schema, old.name()),
                    },
                );
            }
            if let Some(new) = &item.diff.new {
                self.push(
                    UpgradeStage::CreateCollations,
                    SqlDdl::CreateCollation {
                        schema: schema.to_string(),
                        collation: new.clone(),
                    },
                );
            }
        }
        for item in &diff.partition_functions {
            let schema = item.schema.as_str();
            if let Some(old) = &item.diff.old {
                let stage = if item.diff.new.is_some() {
                    UpgradeStage::DropReplaced
                } else {
                    UpgradeStage::DropPartitionFunctions
                };
                self.push(
                    stage,
                    SqlDdl::DropPartitionFunction {
                        name: QualifiedName::new(schema, old.name()),
                    },
                );
            }
            if let Some(new) = &item.diff.new {
                self.push(
                    UpgradeStage::CreatePartitionFunctions,
                    SqlDdl::CreatePartitionFunction {
                        schema: schema.to_string(),
                        function: new.clone(),
                    },
                );
            }
        }
    }
}

const fn is_foreign_key(constraint: &Constraint) -> bool {
    constraint.as_foreign_key().is_some()
}

/// Old names of surviving tables whose columns, name or kind change.
fn reshaped_tables(diff: &CatalogDiff) -> Vec<QualifiedName> {
    diff.tables
        .iter()
        .filter_map(|table| match (&table.old_name, &table.old, &table.new) {
            (Some(name), Some(old), Some(new))
                if old.kind != new.kind
                    || !table.columns.is_empty()
                    || table.is_moved()
                    || table.is_renamed() =>
            {
                Some(name.clone())
            }
            _ => None,
        })
        .collect()
}

/// Only the settings that differ; unset fields stay as they are.
fn changed_settings(old: &SequenceDescriptor, new: &SequenceDescriptor) -> SequenceDescriptor {
    fn changed<T: PartialEq + Copy>(old: Option<T>, new: Option<T>) -> Option<T> {
        if old == new {
            None
        } else {
            new
        }
    }
    SequenceDescriptor {
        start_value: changed(old.start_value, new.start_value),
        increment: changed(old.increment, new.increment),
        min_value: changed(old.min_value, new.min_value),
        max_value: changed(old.max_value, new.max_value),
        is_cyclic: changed(old.is_cyclic, new.is_cyclic),
    }
}

/// Orders tables so that a referenced table comes before every table
/// referencing it. References outside the set are ignored; tables on a
/// cycle keep their name order at the end.
fn dependency_order(tables: Vec<(QualifiedName, &Table)>) -> Vec<(QualifiedName, &Table)> {
    let mut pending: BTreeMap<QualifiedName, &Table> = tables.into_iter().collect();
    let mut ordered = Vec::with_capacity(pending.len());

    loop {
        let names: BTreeSet<&QualifiedName> = pending.keys().collect();
        let ready: Vec<QualifiedName> = pending
            .iter()
            .filter(|(name, table)| {
                table.foreign_keys().all(|(_, fk)| {
                    fk.referenced_table == **name || !names.contains(&fk.referenced_table)
                })
            })
            .map(|(name, _)| name.clone())
            .collect();
        if ready.is_empty() {
            break;
        }
        for name in ready {
            if let Some(table) = pending.remove(&name) {
                ordered.push((name, table));
            }
        }
    }
    ordered.extend(pending);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SqlSelect, SqlTableRef};
    use crate::model::{ForeignKey, SqlType, SqlValueType, TableKind, ViewDefinition};

    fn customers() -> Table {
        let mut table = Table::new("customers");
        table.create_column("id", SqlType::Int32).unwrap();
        table.create_primary_key("pk_customers", &["id"]).unwrap();
        table
    }

    fn orders() -> Table {
        let mut table = Table::new("orders");
        table.create_column("id", SqlType::Int32).unwrap();
        table.create_column("customer_id", SqlType::Int32).unwrap();
        table.create_primary_key("pk_orders", &["id"]).unwrap();
        table
            .add_constraint(Constraint::foreign_key(
                "fk_orders_customers",
                ForeignKey::new(QualifiedName::new("main", "customers"))
                    .with_columns("customer_id", "id"),
            ))
            .unwrap();
        table
    }

    fn shop(tables: Vec<Table>) -> Catalog {
        let mut catalog = Catalog::new("shop");
        let main = catalog.create_schema("main").unwrap();
        for table in tables {
            main.add_table(table).unwrap();
        }
        catalog
    }

    fn position(plan: &UpgradePlan, label: &str, name: &str) -> usize {
        plan.statements()
            .position(|s| match s {
                SqlDdl::CreateTable { table, .. } => label == "create" && table.name() == name,
                SqlDdl::DropTable { table, .. } => label == "drop" && table.name == name,
                _ => false,
            })
            .unwrap()
    }

    fn perform() -> UpgradePlanner {
        UpgradePlanner::new().mode(UpgradeMode::Perform)
    }

    #[test]
    fn identical_catalogs_plan_nothing() {
        let catalog = shop(vec![customers(), orders()]);
        let plan = UpgradePlanner::new().plan(&catalog, &catalog).unwrap();
        assert!(plan.is_empty());
        assert!(plan.diff().is_empty());
    }

    #[test]
    fn referenced_tables_are_created_first_and_dropped_last() {
        let empty = shop(Vec::new());
        let full = shop(vec![orders(), customers()]);

        let create = perform().plan(&empty, &full).unwrap();
        assert!(position(&create, "create", "customers") < position(&create, "create", "orders"));
        let last = create.actions().last().unwrap();
        assert_eq!(last.stage, UpgradeStage::CreateForeignKeys);

        let drop = perform().plan(&full, &empty).unwrap();
        assert!(position(&drop, "drop", "orders") < position(&drop, "drop", "customers"));
        assert_eq!(drop.report().len(), 2);
    }

    #[test]
    fn inline_foreign_keys_stay_in_create_table() {
        let empty = shop(Vec::new());
        let full = shop(vec![orders(), customers()]);
        let plan = perform()
            .inline_foreign_keys(true)
            .plan(&empty, &full)
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan
            .actions()
            .iter()
            .all(|a| a.stage == UpgradeStage::CreateTables));
    }

    #[test]
    fn safe_mode_reports_every_issue() {
        let old = shop(vec![customers(), orders()]);
        let mut new = shop(vec![customers()]);
        new.table_mut(&QualifiedName::new("main", "customers"))
            .unwrap()
            .column_mut("id")
            .unwrap()
            .data_type = SqlValueType::new(SqlType::Int16);

        let err = UpgradePlanner::new().plan(&old, &new).unwrap_err();
        let UpgradeError::UnsafeUpgrade(report) = err else {
            panic!("expected an unsafe upgrade, got {err:?}");
        };
        assert_eq!(report.len(), 2);
        assert!(report.to_string().contains("main.orders: table would be dropped"));
    }

    #[test]
    fn remove_hint_acknowledges_data_loss() {
        let old = shop(vec![customers(), orders()]);
        let new = shop(vec![customers()]);
        let plan = UpgradePlanner::new()
            .hint(UpgradeHint::remove("main.orders").unwrap())
            .plan(&old, &new)
            .unwrap();
        assert_eq!(plan.len(), 1);
        assert!(plan.report().is_empty());
    }

    #[test]
    fn widening_is_safe() {
        let old = shop(vec![customers()]);
        let mut new = shop(vec![customers()]);
        new.table_mut(&QualifiedName::new("main", "customers"))
            .unwrap()
            .column_mut("id")
            .unwrap()
            .data_type = SqlValueType::new(SqlType::Int64);
        let plan = UpgradePlanner::new().plan(&old, &new).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.actions()[0].stage, UpgradeStage::AlterColumns);
    }

    #[test]
    fn ignored_tables_are_never_touched() {
        let old = shop(vec![customers()]);
        let mut legacy = Table::new("legacy_audit");
        legacy.create_column("id", SqlType::Int32).unwrap();
        let new = shop(vec![customers(), legacy]);
        let plan = UpgradePlanner::new()
            .ignore(IgnoreRule::table("legacy_*"))
            .plan(&old, &new)
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn table_rename_hint_renames_in_place() {
        let old = shop(vec![customers()]);
        let mut new = shop(Vec::new());
        let mut renamed = Table::new("clients");
        renamed.create_column("id", SqlType::Int32).unwrap();
        renamed.create_primary_key("pk_customers", &["id"]).unwrap();
        new.schema_mut("main").unwrap().add_table(renamed).unwrap();

        let plan = UpgradePlanner::new()
            .hint(UpgradeHint::rename("main.customers", "main.clients").unwrap())
            .plan(&old, &new)
            .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan.actions()[0].statement,
            SqlDdl::RenameTable {
                table: QualifiedName::new("main", "customers"),
                new_name: "clients".to_string(),
            }
        );
    }

    #[test]
    fn kind_change_reattaches_inbound_foreign_keys() {
        let old = shop(vec![customers(), orders()]);
        let mut new = shop(vec![customers(), orders()]);
        new.table_mut(&QualifiedName::new("main", "customers"))
            .unwrap()
            .kind = TableKind::Temporary {
            is_global: false,
            preserve_rows: true,
        };

        let plan = perform().plan(&old, &new).unwrap();
        let stages: Vec<UpgradeStage> = plan.actions().iter().map(|a| a.stage).collect();
        assert_eq!(
            stages,
            [
                UpgradeStage::DropForeignKeys,
                UpgradeStage::DropTables,
                UpgradeStage::CreateTables,
                UpgradeStage::CreateForeignKeys,
            ]
        );
        let orders = QualifiedName::new("main", "orders");
        assert_eq!(
            plan.actions()[0].statement,
            SqlDdl::alter(
                orders.clone(),
                SqlAlterAction::DropConstraint {
                    name: "fk_orders_customers".to_string(),
                    cascade: false,
                },
            )
        );
        let SqlDdl::AlterTable {
            table,
            action: SqlAlterAction::AddConstraint(constraint),
        } = &plan.actions()[3].statement
        else {
            panic!("expected the foreign key to be added back");
        };
        assert_eq!(table, &orders);
        assert_eq!(constraint.name(), "fk_orders_customers");
    }

    #[test]
    fn views_over_altered_columns_are_rebuilt() {
        let customer_ids = || {
            View::new("customer_ids").with_definition(ViewDefinition::Query(Box::new(
                SqlSelect::from_source(SqlTableRef::new(QualifiedName::new("main", "customers"))),
            )))
        };
        let mut old = shop(vec![customers()]);
        old.schema_mut("main")
            .unwrap()
            .add_view(customer_ids())
            .unwrap();
        let mut new = old.clone();
        new.table_mut(&QualifiedName::new("main", "customers"))
            .unwrap()
            .column_mut("id")
            .unwrap()
            .data_type = SqlValueType::new(SqlType::Int64);

        let plan = UpgradePlanner::new().plan(&old, &new).unwrap();
        let stages: Vec<UpgradeStage> = plan.actions().iter().map(|a| a.stage).collect();
        assert_eq!(
            stages,
            [
                UpgradeStage::DropViews,
                UpgradeStage::AlterColumns,
                UpgradeStage::CreateViews,
            ]
        );
        assert!(plan.diff().views.is_empty());

        // A view over an untouched table stays put.
        let mut unrelated = old.clone();
        unrelated
            .schema_mut("main")
            .unwrap()
            .add_table(orders())
            .unwrap();
        let plan = UpgradePlanner::new().plan(&old, &unrelated).unwrap();
        assert!(plan
            .statements()
            .all(|s| !matches!(s, SqlDdl::DropView { .. })));
    }
}
