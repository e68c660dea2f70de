//! Typed literal values.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A typed constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlLiteral {
    /// NULL.
    Null,
    /// Boolean.
    Boolean(bool),
    /// Integer.
    Integer(i64),
    /// Floating point.
    Double(f64),
    /// Exact decimal, kept as its text form.
    Decimal(String),
    /// Character string.
    String(String),
    /// Byte string.
    Binary(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
    /// Date and time with offset.
    DateTimeOffset(DateTime<FixedOffset>),
    /// Time span in nanoseconds.
    Interval(i64),
    /// Unique identifier in canonical text form.
    Guid(String),
}

impl SqlLiteral {
    /// Returns `true` for NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The integer value, if this is an integer literal.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<bool> for SqlLiteral {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for SqlLiteral {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for SqlLiteral {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlLiteral {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for SqlLiteral {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SqlLiteral {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NaiveDate> for SqlLiteral {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for SqlLiteral {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for SqlLiteral {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTimeOffset(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlLiteral {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
