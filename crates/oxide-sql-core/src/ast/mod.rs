//! Vendor-neutral SQL expression and statement tree.
//!
//! Nodes describe semantic intent only, for example "construct a date from
//! year, month and day", and never vendor syntax. Dialects turn them into
//! text through [`crate::compiler::SqlCompiler`].
//!
//! ```rust
//! use oxide_sql_core::ast::{SqlExpression, SqlSelect, SqlTableRef};
//! use oxide_sql_core::model::QualifiedName;
//!
//! let orders = SqlTableRef::new(QualifiedName::new("main", "orders"));
//! let query = SqlSelect::from_source(orders.clone())
//!     .column(orders.column("id"))
//!     .filter(orders.column("total").gt(SqlExpression::literal(100)));
//! assert!(query.filter.is_some());
//! ```

mod clone;
mod ddl;
mod expression;
mod function;
mod hint;
mod literal;
mod statement;
mod visit;

pub use clone::{CloneContext, CloneWith};
pub use ddl::{ColumnChange, SqlAlterAction, SqlDdl};
pub use expression::{
    BinaryOperator, SqlCaseBranch, SqlColumnRef, SqlExpression, SqlParameter, TableRefId,
    UnaryOperator,
};
pub use function::{AggregateFunction, DateTimePart, SqlFunction};
pub use hint::SqlHint;
pub use literal::SqlLiteral;
pub use statement::{
    InsertSource, JoinType, OrderDirection, SqlAssignment, SqlDelete, SqlFrom, SqlInsert,
    SqlOrder, SqlSelect, SqlSelectItem, SqlStatement, SqlTableRef, SqlUpdate,
};
pub use visit::{Accept, SqlVisitor};
