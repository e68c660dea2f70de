//! Deep cloning with table reference remapping.

use std::collections::{BTreeSet, HashMap};

use super::ddl::{SqlAlterAction, SqlDdl};
use super::expression::{SqlExpression, TableRefId};
use super::statement::{
    InsertSource, SqlDelete, SqlFrom, SqlInsert, SqlSelect, SqlStatement, SqlUpdate,
};
use crate::model::{ConstraintKind, QualifiedName, ViewDefinition};

/// Identity map for one clone operation.
///
/// Every table reference defined inside the cloned tree gets a fresh
/// [`TableRefId`], and column references into it follow. References to
/// tables defined outside the tree (correlated subqueries) keep their id.
/// Reusing one context across several calls keeps separately cloned
/// fragments bound to the same new references.
#[derive(Debug, Default)]
pub struct CloneContext {
    mapping: HashMap<TableRefId, TableRefId>,
}

impl CloneContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The id `original` was cloned into, if it was.
    #[must_use]
    pub fn mapped(&self, original: TableRefId) -> Option<TableRefId> {
        self.mapping.get(&original).copied()
    }

    fn define(&mut self, original: TableRefId) {
        self.mapping.entry(original).or_insert_with(TableRefId::fresh);
    }

    fn remap(&self, id: &mut TableRefId) {
        if let Some(mapped) = self.mapping.get(id) {
            *id = *mapped;
        }
    }
}

/// How a visited id is used. Definitions of named tables carry the name.
#[derive(Clone, Copy)]
enum Role<'a> {
    Definition(Option<&'a QualifiedName>),
    Reference,
}

/// Nodes that can be deep cloned through a [`CloneContext`].
pub trait CloneWith {
    /// Returns a copy whose table references are fresh.
    #[must_use]
    fn clone_with(&self, context: &mut CloneContext) -> Self;
}

trait TableRefIds: Clone {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>));
}

fn clone_remapped<T: TableRefIds>(node: &T, context: &mut CloneContext) -> T {
    let mut copy = node.clone();
    copy.for_each_id(&mut |id, role| {
        if matches!(role, Role::Definition(_)) {
            context.define(*id);
        }
    });
    copy.for_each_id(&mut |id, _| context.remap(id));
    copy
}

macro_rules! clone_with {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CloneWith for $ty {
                fn clone_with(&self, context: &mut CloneContext) -> Self {
                    clone_remapped(self, context)
                }
            }
        )*
    };
}

clone_with!(
    SqlExpression,
    SqlFrom,
    SqlSelect,
    SqlInsert,
    SqlUpdate,
    SqlDelete,
    SqlDdl,
    SqlStatement,
);

impl SqlSelect {
    /// Tables this query reads, including those of joins, derived tables
    /// and subqueries.
    #[must_use]
    pub fn source_tables(&self) -> BTreeSet<QualifiedName> {
        let mut tables = BTreeSet::new();
        self.clone().for_each_id(&mut |_, role| {
            if let Role::Definition(Some(table)) = role {
                tables.insert(table.clone());
            }
        });
        tables
    }
}

fn option<T: TableRefIds>(node: Option<&mut T>, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
    if let Some(node) = node {
        node.for_each_id(f);
    }
}

impl TableRefIds for SqlExpression {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
        match self {
            Self::Column(column) => {
                if let Some(id) = &mut column.table {
                    f(id, Role::Reference);
                }
            }
            Self::Asterisk(Some(id)) => f(id, Role::Reference),
            Self::Unary { operand, .. }
            | Self::Cast { operand, .. }
            | Self::Extract { operand, .. } => operand.for_each_id(f),
            Self::Binary { left, right, .. } => {
                left.for_each_id(f);
                right.for_each_id(f);
            }
            Self::Between {
                operand, low, high, ..
            } => {
                operand.for_each_id(f);
                low.for_each_id(f);
                high.for_each_id(f);
            }
            Self::Function { args, .. } | Self::UserFunction { args, .. } | Self::Row(args) => {
                for arg in args {
                    arg.for_each_id(f);
                }
            }
            Self::Aggregate { argument, .. } => option(argument.as_deref_mut(), f),
            Self::Case {
                operand,
                branches,
                otherwise,
            } => {
                option(operand.as_deref_mut(), f);
                for branch in branches {
                    branch.when.for_each_id(f);
                    branch.then.for_each_id(f);
                }
                option(otherwise.as_deref_mut(), f);
            }
            Self::Subquery(select) | Self::Exists(select) => select.for_each_id(f),
            Self::Literal(_)
            | Self::Asterisk(None)
            | Self::Parameter(_)
            | Self::Array(_)
            | Self::Native(_)
            | Self::Default => {}
        }
    }
}

impl TableRefIds for SqlFrom {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
        match self {
            Self::Table(table) => f(&mut table.id, Role::Definition(Some(&table.table))),
            Self::Join {
                left, right, on, ..
            } => {
                left.for_each_id(f);
                right.for_each_id(f);
                option(on.as_mut(), f);
            }
            Self::Query { id, select, .. } => {
                f(id, Role::Definition(None));
                select.for_each_id(f);
            }
        }
    }
}

impl TableRefIds for SqlSelect {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
        option(self.from.as_mut(), f);
        for item in &mut self.columns {
            item.expression.for_each_id(f);
        }
        option(self.filter.as_mut(), f);
        for key in &mut self.group_by {
            key.for_each_id(f);
        }
        option(self.having.as_mut(), f);
        for order in &mut self.order_by {
            order.expression.for_each_id(f);
        }
        option(self.limit.as_mut(), f);
        option(self.offset.as_mut(), f);
    }
}

impl TableRefIds for SqlInsert {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
        f(&mut self.table.id, Role::Definition(Some(&self.table.table)));
        match &mut self.source {
            InsertSource::Values(rows) => {
                for value in rows.iter_mut().flatten() {
                    value.for_each_id(f);
                }
            }
            InsertSource::Select(select) => select.for_each_id(f),
            InsertSource::DefaultValues => {}
        }
    }
}

impl TableRefIds for SqlUpdate {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
        f(&mut self.table.id, Role::Definition(Some(&self.table.table)));
        for assignment in &mut self.assignments {
            assignment.value.for_each_id(f);
        }
        option(self.filter.as_mut(), f);
    }
}

impl TableRefIds for SqlDelete {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
        f(&mut self.table.id, Role::Definition(Some(&self.table.table)));
        option(self.filter.as_mut(), f);
    }
}

impl TableRefIds for SqlDdl {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
        match self {
            Self::CreateTable { table, .. } => {
                for constraint in table.constraints_mut().iter_mut() {
                    if let ConstraintKind::Check { condition } = &mut constraint.kind {
                        condition.for_each_id(f);
                    }
                }
            }
            Self::CreateView { view, .. } => {
                if let Some(ViewDefinition::Query(select)) = &mut view.definition {
                    select.for_each_id(f);
                }
            }
            Self::AlterTable {
                action: SqlAlterAction::AddConstraint(constraint),
                ..
            } => {
                if let ConstraintKind::Check { condition } = &mut constraint.kind {
                    condition.for_each_id(f);
                }
            }
            _ => {}
        }
    }
}

impl TableRefIds for SqlStatement {
    fn for_each_id(&mut self, f: &mut dyn FnMut(&mut TableRefId, Role<'_>)) {
        match self {
            Self::Select(node) => node.for_each_id(f),
            Self::Insert(node) => node.for_each_id(f),
            Self::Update(node) => node.for_each_id(f),
            Self::Delete(node) => node.for_each_id(f),
            Self::Ddl(node) => node.for_each_id(f),
            Self::Batch(nodes) => {
                for node in nodes {
                    node.for_each_id(f);
                }
            }
        }
    }
}
