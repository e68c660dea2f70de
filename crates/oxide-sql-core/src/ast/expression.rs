//! Expression nodes.

use core::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::function::{AggregateFunction, DateTimePart, SqlFunction};
use super::literal::SqlLiteral;
use super::statement::SqlSelect;
use crate::model::SqlValueType;

static NEXT_TABLE_REF: AtomicU64 = AtomicU64::new(1);

/// Identity of a table reference within a statement tree.
///
/// Column references point at their table reference through this id, so the
/// relation survives moves and is remapped by
/// [`CloneContext`](super::CloneContext) on deep clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRefId(u64);

impl TableRefId {
    /// Allocates a fresh id.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_TABLE_REF.fetch_add(1, Ordering::Relaxed))
    }
}

/// A column, optionally bound to a table reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlColumnRef {
    /// Owning table reference, if qualified.
    pub table: Option<TableRefId>,
    /// Column name.
    pub name: String,
}

/// A bound or unbound query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    /// Name for named binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Value, when known at compile time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SqlLiteral>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// String concatenation.
    Concat,
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IN` against a row, array or subquery.
    In,
    /// `NOT IN` against a row, array or subquery.
    NotIn,
    /// Bitwise and.
    BitAnd,
    /// Bitwise or.
    BitOr,
    /// Bitwise exclusive or.
    BitXor,
    /// Datetime plus interval.
    DateTimePlusInterval,
    /// Datetime minus interval.
    DateTimeMinusInterval,
    /// Difference of two datetimes, an interval.
    DateTimeMinusDateTime,
    /// Datetime with offset plus interval.
    DateTimeOffsetPlusInterval,
    /// Datetime with offset minus interval.
    DateTimeOffsetMinusInterval,
    /// Difference of two datetimes with offset.
    DateTimeOffsetMinusDateTimeOffset,
}

impl BinaryOperator {
    /// Default SQL spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add
            | Self::DateTimePlusInterval
            | Self::DateTimeOffsetPlusInterval => "+",
            Self::Subtract
            | Self::DateTimeMinusInterval
            | Self::DateTimeMinusDateTime
            | Self::DateTimeOffsetMinusInterval
            | Self::DateTimeOffsetMinusDateTimeOffset => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Concat => "||",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
        }
    }

    /// Binding strength; higher binds tighter.
    ///
    /// Unary NOT sits between AND and the comparisons, postfix null tests
    /// bind like comparisons and prefix negation binds tighter than any
    /// infix operator.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 2,
            Self::And => 4,
            Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::LessOrEqual
            | Self::Greater
            | Self::GreaterOrEqual
            | Self::Like
            | Self::NotLike
            | Self::In
            | Self::NotIn => 6,
            Self::BitOr | Self::BitXor => 8,
            Self::BitAnd => 10,
            Self::Add
            | Self::Subtract
            | Self::Concat
            | Self::DateTimePlusInterval
            | Self::DateTimeMinusInterval
            | Self::DateTimeMinusDateTime
            | Self::DateTimeOffsetPlusInterval
            | Self::DateTimeOffsetMinusInterval
            | Self::DateTimeOffsetMinusDateTimeOffset => 12,
            Self::Multiply | Self::Divide | Self::Modulo => 14,
        }
    }

    /// Returns `true` when `a op (b op c)` equals `(a op b) op c`.
    #[must_use]
    pub const fn is_associative(self) -> bool {
        matches!(
            self,
            Self::And
                | Self::Or
                | Self::Add
                | Self::Multiply
                | Self::Concat
                | Self::BitAnd
                | Self::BitOr
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Logical NOT.
    Not,
    /// Arithmetic negation.
    Negate,
    /// Bitwise NOT.
    BitNot,
    /// `IS NULL`, postfix.
    IsNull,
    /// `IS NOT NULL`, postfix.
    IsNotNull,
}

impl UnaryOperator {
    /// Binding strength on the same scale as [`BinaryOperator::precedence`].
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Not => 5,
            Self::IsNull | Self::IsNotNull => 6,
            Self::Negate | Self::BitNot => 16,
        }
    }
}

/// One `WHEN ... THEN ...` branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlCaseBranch {
    /// Condition, or value matched against the CASE operand.
    pub when: SqlExpression,
    /// Result.
    pub then: SqlExpression,
}

/// A vendor-neutral expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlExpression {
    /// A constant.
    Literal(SqlLiteral),
    /// A column reference.
    Column(SqlColumnRef),
    /// `*` or `t.*`.
    Asterisk(Option<TableRefId>),
    /// A query parameter.
    Parameter(SqlParameter),
    /// Prefix or postfix operator.
    Unary {
        /// Operator.
        op: UnaryOperator,
        /// Operand.
        operand: Box<SqlExpression>,
    },
    /// Infix operator.
    Binary {
        /// Operator.
        op: BinaryOperator,
        /// Left operand.
        left: Box<SqlExpression>,
        /// Right operand.
        right: Box<SqlExpression>,
    },
    /// `BETWEEN` range test.
    Between {
        /// Tested value.
        operand: Box<SqlExpression>,
        /// Lower bound.
        low: Box<SqlExpression>,
        /// Upper bound.
        high: Box<SqlExpression>,
        /// `NOT BETWEEN`.
        negated: bool,
    },
    /// Canonical function call.
    Function {
        /// Function.
        function: SqlFunction,
        /// Arguments.
        args: Vec<SqlExpression>,
    },
    /// Function called by its vendor name.
    UserFunction {
        /// Function name, emitted as is.
        name: String,
        /// Arguments.
        args: Vec<SqlExpression>,
    },
    /// Aggregate call.
    Aggregate {
        /// Aggregate.
        function: AggregateFunction,
        /// `DISTINCT` modifier.
        distinct: bool,
        /// Argument; `None` means `*`.
        argument: Option<Box<SqlExpression>>,
    },
    /// Type conversion.
    Cast {
        /// Converted value.
        operand: Box<SqlExpression>,
        /// Target type.
        target: SqlValueType,
    },
    /// Part extraction from a temporal value.
    Extract {
        /// Extracted part.
        part: DateTimePart,
        /// Temporal operand.
        operand: Box<SqlExpression>,
    },
    /// `CASE` expression.
    Case {
        /// Simple CASE operand.
        operand: Option<Box<SqlExpression>>,
        /// Branches in order.
        branches: Vec<SqlCaseBranch>,
        /// `ELSE` result.
        otherwise: Option<Box<SqlExpression>>,
    },
    /// Row constructor `(a, b, ...)`.
    Row(Vec<SqlExpression>),
    /// Inline array of constants.
    Array(Vec<SqlLiteral>),
    /// Scalar subquery.
    Subquery(Box<SqlSelect>),
    /// `EXISTS (subquery)`.
    Exists(Box<SqlSelect>),
    /// Opaque vendor text, emitted verbatim.
    Native(String),
    /// `DEFAULT` keyword.
    Default,
}

impl SqlExpression {
    /// A literal.
    #[must_use]
    pub fn literal(value: impl Into<SqlLiteral>) -> Self {
        Self::Literal(value.into())
    }

    /// NULL.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(SqlLiteral::Null)
    }

    /// An unqualified column.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(SqlColumnRef {
            table: None,
            name: name.into(),
        })
    }

    /// Native vendor text.
    #[must_use]
    pub fn native(text: impl Into<String>) -> Self {
        Self::Native(text.into())
    }

    /// An anonymous parameter bound to a value.
    #[must_use]
    pub fn parameter(value: impl Into<SqlLiteral>) -> Self {
        Self::Parameter(SqlParameter {
            name: None,
            value: Some(value.into()),
        })
    }

    /// A canonical function call.
    #[must_use]
    pub const fn function(function: SqlFunction, args: Vec<Self>) -> Self {
        Self::Function { function, args }
    }

    /// A call by vendor function name.
    #[must_use]
    pub fn user_function(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::UserFunction {
            name: name.into(),
            args,
        }
    }

    /// `COUNT(*)`.
    #[must_use]
    pub const fn count_all() -> Self {
        Self::Aggregate {
            function: AggregateFunction::Count,
            distinct: false,
            argument: None,
        }
    }

    /// Infix operator.
    #[must_use]
    pub fn binary(op: BinaryOperator, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Prefix or postfix operator.
    #[must_use]
    pub fn unary(op: UnaryOperator, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// `CAST(self AS target)`.
    #[must_use]
    pub fn cast(self, target: SqlValueType) -> Self {
        Self::Cast {
            operand: Box::new(self),
            target,
        }
    }

    /// `EXTRACT(part FROM self)`.
    #[must_use]
    pub fn extract(self, part: DateTimePart) -> Self {
        Self::Extract {
            part,
            operand: Box::new(self),
        }
    }

    /// `CASE WHEN when THEN then ELSE otherwise END`.
    #[must_use]
    pub fn when(when: Self, then: Self, otherwise: Self) -> Self {
        Self::Case {
            operand: None,
            branches: vec![SqlCaseBranch { when, then }],
            otherwise: Some(Box::new(otherwise)),
        }
    }

    /// `self = other`.
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Equal, self, other)
    }

    /// `self <> other`.
    #[must_use]
    pub fn not_eq(self, other: Self) -> Self {
        Self::binary(BinaryOperator::NotEqual, self, other)
    }

    /// `self < other`.
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Less, self, other)
    }

    /// `self >= other`.
    #[must_use]
    pub fn ge(self, other: Self) -> Self {
        Self::binary(BinaryOperator::GreaterOrEqual, self, other)
    }

    /// `self > other`.
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Greater, self, other)
    }

    /// `self AND other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(BinaryOperator::And, self, other)
    }

    /// `self OR other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Or, self, other)
    }

    /// `self + other`.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Add, self, other)
    }

    /// `self - other`.
    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Subtract, self, other)
    }

    /// `self * other`.
    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Multiply, self, other)
    }

    /// `self / other`.
    #[must_use]
    pub fn div(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Divide, self, other)
    }

    /// `self % other`.
    #[must_use]
    pub fn rem(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Modulo, self, other)
    }

    /// String concatenation.
    #[must_use]
    pub fn concat(self, other: Self) -> Self {
        Self::binary(BinaryOperator::Concat, self, other)
    }

    /// `self IN (values)` against an inline array.
    #[must_use]
    pub fn in_array(self, values: Vec<SqlLiteral>) -> Self {
        Self::binary(BinaryOperator::In, self, Self::Array(values))
    }

    /// `self NOT IN (values)` against an inline array.
    #[must_use]
    pub fn not_in_array(self, values: Vec<SqlLiteral>) -> Self {
        Self::binary(BinaryOperator::NotIn, self, Self::Array(values))
    }

    /// `self IS NULL`.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::unary(UnaryOperator::IsNull, self)
    }

    /// `self IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::unary(UnaryOperator::IsNotNull, self)
    }

    /// `NOT self`.
    #[must_use]
    pub fn not(self) -> Self {
        Self::unary(UnaryOperator::Not, self)
    }

    /// `-self`.
    #[must_use]
    pub fn neg(self) -> Self {
        Self::unary(UnaryOperator::Negate, self)
    }

    /// The integer value of an integer literal.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Literal(literal) => literal.as_integer(),
            _ => None,
        }
    }
}

impl From<SqlLiteral> for SqlExpression {
    fn from(value: SqlLiteral) -> Self {
        Self::Literal(value)
    }
}

impl From<i64> for SqlExpression {
    fn from(value: i64) -> Self {
        Self::literal(value)
    }
}

impl From<&str> for SqlExpression {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}
