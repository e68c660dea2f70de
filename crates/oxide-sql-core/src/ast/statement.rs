//! DML statement nodes.

use serde::{Deserialize, Serialize};

use super::ddl::SqlDdl;
use super::expression::{SqlColumnRef, SqlExpression, TableRefId};
use super::hint::SqlHint;
use crate::model::QualifiedName;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlOrder {
    /// Sort key.
    pub expression: SqlExpression,
    /// Direction.
    #[serde(default)]
    pub direction: OrderDirection,
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A reference to a table in a FROM clause.
///
/// Holds the table by name only; lookups against a [`Catalog`](crate::model::Catalog)
/// resolve it, nothing owns the table through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlTableRef {
    /// Identity that column references bind to.
    pub id: TableRefId,
    /// Referenced table.
    pub table: QualifiedName,
    /// Optional alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl SqlTableRef {
    /// A reference with a fresh identity.
    #[must_use]
    pub fn new(table: QualifiedName) -> Self {
        Self {
            id: TableRefId::fresh(),
            table,
            alias: None,
        }
    }

    /// Sets the alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// A column bound to this reference.
    #[must_use]
    pub fn column(&self, name: impl Into<String>) -> SqlExpression {
        SqlExpression::Column(SqlColumnRef {
            table: Some(self.id),
            name: name.into(),
        })
    }

    /// `alias.*`.
    #[must_use]
    pub const fn asterisk(&self) -> SqlExpression {
        SqlExpression::Asterisk(Some(self.id))
    }
}

/// A FROM clause source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlFrom {
    /// A table.
    Table(SqlTableRef),
    /// A join of two sources.
    Join {
        /// Join type.
        kind: JoinType,
        /// Left source.
        left: Box<SqlFrom>,
        /// Right source.
        right: Box<SqlFrom>,
        /// Join condition; absent for CROSS JOIN.
        on: Option<SqlExpression>,
    },
    /// A derived table.
    Query {
        /// Identity that column references bind to.
        id: TableRefId,
        /// Inner query.
        select: Box<SqlSelect>,
        /// Alias, required by most engines.
        alias: String,
    },
}

impl SqlFrom {
    /// Joins `right` onto this source.
    #[must_use]
    pub fn join(self, kind: JoinType, right: impl Into<Self>, on: SqlExpression) -> Self {
        Self::Join {
            kind,
            left: Box::new(self),
            right: Box::new(right.into()),
            on: Some(on),
        }
    }

    /// A derived table with a fresh identity.
    #[must_use]
    pub fn query(select: SqlSelect, alias: impl Into<String>) -> Self {
        Self::Query {
            id: TableRefId::fresh(),
            select: Box::new(select),
            alias: alias.into(),
        }
    }
}

impl From<SqlTableRef> for SqlFrom {
    fn from(table: SqlTableRef) -> Self {
        Self::Table(table)
    }
}

/// A projected column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlSelectItem {
    /// Projected expression.
    pub expression: SqlExpression,
    /// `AS` alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SqlSelect {
    /// `DISTINCT`.
    #[serde(default)]
    pub distinct: bool,
    /// Projection; empty means `*`.
    #[serde(default)]
    pub columns: Vec<SqlSelectItem>,
    /// FROM clause.
    #[serde(default)]
    pub from: Option<SqlFrom>,
    /// WHERE clause.
    #[serde(default)]
    pub filter: Option<SqlExpression>,
    /// GROUP BY keys.
    #[serde(default)]
    pub group_by: Vec<SqlExpression>,
    /// HAVING clause.
    #[serde(default)]
    pub having: Option<SqlExpression>,
    /// ORDER BY entries.
    #[serde(default)]
    pub order_by: Vec<SqlOrder>,
    /// Row limit.
    #[serde(default)]
    pub limit: Option<SqlExpression>,
    /// Rows skipped.
    #[serde(default)]
    pub offset: Option<SqlExpression>,
    /// Optimizer hints.
    #[serde(default)]
    pub hints: Vec<SqlHint>,
}

impl SqlSelect {
    /// An empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A query over one source.
    #[must_use]
    pub fn from_source(source: impl Into<SqlFrom>) -> Self {
        Self {
            from: Some(source.into()),
            ..Self::default()
        }
    }

    /// Appends a projected column.
    #[must_use]
    pub fn column(mut self, expression: SqlExpression) -> Self {
        self.columns.push(SqlSelectItem {
            expression,
            alias: None,
        });
        self
    }

    /// Appends an aliased projected column.
    #[must_use]
    pub fn column_as(mut self, expression: SqlExpression, alias: impl Into<String>) -> Self {
        self.columns.push(SqlSelectItem {
            expression,
            alias: Some(alias.into()),
        });
        self
    }

    /// Sets `DISTINCT`.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// ANDs a condition into the WHERE clause.
    #[must_use]
    pub fn filter(mut self, condition: SqlExpression) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Appends a GROUP BY key.
    #[must_use]
    pub fn group_by(mut self, key: SqlExpression) -> Self {
        self.group_by.push(key);
        self
    }

    /// Sets the HAVING clause.
    #[must_use]
    pub fn having(mut self, condition: SqlExpression) -> Self {
        self.having = Some(condition);
        self
    }

    /// Appends an ORDER BY entry.
    #[must_use]
    pub fn order_by(mut self, expression: SqlExpression, direction: OrderDirection) -> Self {
        self.order_by.push(SqlOrder {
            expression,
            direction,
        });
        self
    }

    /// Sets the row limit.
    #[must_use]
    pub fn limit(mut self, rows: i64) -> Self {
        self.limit = Some(SqlExpression::literal(rows));
        self
    }

    /// Sets the number of skipped rows.
    #[must_use]
    pub fn offset(mut self, rows: i64) -> Self {
        self.offset = Some(SqlExpression::literal(rows));
        self
    }

    /// Adds an optimizer hint.
    #[must_use]
    pub fn hint(mut self, hint: SqlHint) -> Self {
        self.hints.push(hint);
        self
    }
}

/// The row source of an INSERT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertSource {
    /// `VALUES (...), (...)`.
    Values(Vec<Vec<SqlExpression>>),
    /// `INSERT ... SELECT`.
    Select(Box<SqlSelect>),
    /// `DEFAULT VALUES`.
    DefaultValues,
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlInsert {
    /// Target table.
    pub table: SqlTableRef,
    /// Target column names.
    pub columns: Vec<String>,
    /// Row source.
    pub source: InsertSource,
}

impl SqlInsert {
    /// A single-row insert.
    #[must_use]
    pub fn values(table: SqlTableRef, row: Vec<(&str, SqlExpression)>) -> Self {
        let (columns, values): (Vec<_>, Vec<_>) = row
            .into_iter()
            .map(|(column, value)| (column.to_string(), value))
            .unzip();
        Self {
            table,
            columns,
            source: InsertSource::Values(vec![values]),
        }
    }
}

/// A `SET column = value` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlAssignment {
    /// Column name.
    pub column: String,
    /// New value.
    pub value: SqlExpression,
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlUpdate {
    /// Target table.
    pub table: SqlTableRef,
    /// Assignments in order.
    pub assignments: Vec<SqlAssignment>,
    /// WHERE clause.
    pub filter: Option<SqlExpression>,
}

impl SqlUpdate {
    /// An update without assignments.
    #[must_use]
    pub const fn new(table: SqlTableRef) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            filter: None,
        }
    }

    /// Adds an assignment.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: SqlExpression) -> Self {
        self.assignments.push(SqlAssignment {
            column: column.into(),
            value,
        });
        self
    }

    /// Sets the WHERE clause.
    #[must_use]
    pub fn filter(mut self, condition: SqlExpression) -> Self {
        self.filter = Some(condition);
        self
    }
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlDelete {
    /// Target table.
    pub table: SqlTableRef,
    /// WHERE clause.
    pub filter: Option<SqlExpression>,
}

/// Any compilable statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlStatement {
    /// SELECT.
    Select(SqlSelect),
    /// INSERT.
    Insert(SqlInsert),
    /// UPDATE.
    Update(SqlUpdate),
    /// DELETE.
    Delete(SqlDelete),
    /// Schema definition.
    Ddl(SqlDdl),
    /// Statements compiled together, separated by `;`.
    Batch(Vec<SqlStatement>),
}

impl From<SqlSelect> for SqlStatement {
    fn from(select: SqlSelect) -> Self {
        Self::Select(select)
    }
}

impl From<SqlInsert> for SqlStatement {
    fn from(insert: SqlInsert) -> Self {
        Self::Insert(insert)
    }
}

impl From<SqlUpdate> for SqlStatement {
    fn from(update: SqlUpdate) -> Self {
        Self::Update(update)
    }
}

impl From<SqlDelete> for SqlStatement {
    fn from(delete: SqlDelete) -> Self {
        Self::Delete(delete)
    }
}

impl From<SqlDdl> for SqlStatement {
    fn from(ddl: SqlDdl) -> Self {
        Self::Ddl(ddl)
    }
}
