//! Double dispatch over statement and expression nodes.

use super::ddl::SqlDdl;
use super::expression::SqlExpression;
use super::statement::{SqlDelete, SqlInsert, SqlSelect, SqlStatement, SqlUpdate};

/// A consumer of AST nodes, one method per node family.
///
/// The compiler is the main implementor. [`Accept::accept`] picks the
/// method for a node.
pub trait SqlVisitor {
    /// Result of visiting one node.
    type Output;
    /// Failure raised by the visitor.
    type Error;

    /// Visits an expression.
    fn visit_expression(&mut self, node: &SqlExpression) -> Result<Self::Output, Self::Error>;

    /// Visits a SELECT.
    fn visit_select(&mut self, node: &SqlSelect) -> Result<Self::Output, Self::Error>;

    /// Visits an INSERT.
    fn visit_insert(&mut self, node: &SqlInsert) -> Result<Self::Output, Self::Error>;

    /// Visits an UPDATE.
    fn visit_update(&mut self, node: &SqlUpdate) -> Result<Self::Output, Self::Error>;

    /// Visits a DELETE.
    fn visit_delete(&mut self, node: &SqlDelete) -> Result<Self::Output, Self::Error>;

    /// Visits a DDL statement.
    fn visit_ddl(&mut self, node: &SqlDdl) -> Result<Self::Output, Self::Error>;

    /// Visits a batch of statements.
    fn visit_batch(&mut self, nodes: &[SqlStatement]) -> Result<Self::Output, Self::Error>;
}

/// A node that dispatches itself to a [`SqlVisitor`].
pub trait Accept {
    /// Calls the visitor method matching this node.
    fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error>;
}

impl Accept for SqlExpression {
    fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_expression(self)
    }
}

impl Accept for SqlSelect {
    fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_select(self)
    }
}

impl Accept for SqlInsert {
    fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_insert(self)
    }
}

impl Accept for SqlUpdate {
    fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_update(self)
    }
}

impl Accept for SqlDelete {
    fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_delete(self)
    }
}

impl Accept for SqlDdl {
    fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_ddl(self)
    }
}

impl Accept for SqlStatement {
    fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        match self {
            Self::Select(node) => visitor.visit_select(node),
            Self::Insert(node) => visitor.visit_insert(node),
            Self::Update(node) => visitor.visit_update(node),
            Self::Delete(node) => visitor.visit_delete(node),
            Self::Ddl(node) => visitor.visit_ddl(node),
            Self::Batch(nodes) => visitor.visit_batch(nodes),
        }
    }
}
