//! Canonical SQL value types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Vendor-neutral type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Boolean.
    Boolean,
    /// 1-byte integer.
    Int8,
    /// 2-byte integer.
    Int16,
    /// 4-byte integer.
    Int32,
    /// 8-byte integer.
    Int64,
    /// Exact numeric with precision and scale.
    Decimal,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Fixed-length character string.
    Char,
    /// Bounded variable-length character string.
    VarChar,
    /// Unbounded character data.
    VarCharMax,
    /// Fixed-length binary.
    Binary,
    /// Bounded variable-length binary.
    VarBinary,
    /// Unbounded binary data.
    VarBinaryMax,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time without zone.
    DateTime,
    /// Date and time with a zone offset.
    DateTimeOffset,
    /// Time span.
    Interval,
    /// 16-byte unique identifier.
    Guid,
    /// A vendor type with no canonical equivalent; see `type_name`.
    Unknown,
}

impl SqlType {
    /// Returns the canonical name of the type code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Decimal => "Decimal",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Char => "Char",
            Self::VarChar => "VarChar",
            Self::VarCharMax => "VarCharMax",
            Self::Binary => "Binary",
            Self::VarBinary => "VarBinary",
            Self::VarBinaryMax => "VarBinaryMax",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::Interval => "Interval",
            Self::Guid => "Guid",
            Self::Unknown => "Unknown",
        }
    }

    /// Width in bytes for integer types.
    #[must_use]
    pub const fn integer_width(self) -> Option<u8> {
        match self {
            Self::Int8 => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 => Some(4),
            Self::Int64 => Some(8),
            _ => None,
        }
    }

    /// Decimal digits needed to hold any value of an integer type.
    #[must_use]
    pub const fn integer_digits(self) -> Option<u8> {
        match self {
            Self::Int8 => Some(3),
            Self::Int16 => Some(5),
            Self::Int32 => Some(10),
            Self::Int64 => Some(19),
            _ => None,
        }
    }

    /// Returns `true` for the integer family.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        self.integer_width().is_some()
    }

    /// Returns `true` for the character family.
    #[must_use]
    pub const fn is_character(self) -> bool {
        matches!(self, Self::Char | Self::VarChar | Self::VarCharMax)
    }

    /// Returns `true` for the binary family.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Binary | Self::VarBinary | Self::VarBinaryMax)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column or expression type: type code plus its facets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlValueType {
    /// The canonical type code.
    pub type_code: SqlType,
    /// Vendor type name when `type_code` is [`SqlType::Unknown`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Length for character and binary types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Precision for exact numerics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    /// Scale for exact numerics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,
}

impl SqlValueType {
    /// Creates a type without facets.
    #[must_use]
    pub const fn new(type_code: SqlType) -> Self {
        Self {
            type_code,
            type_name: None,
            length: None,
            precision: None,
            scale: None,
        }
    }

    /// Creates a vendor type known only by name.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            type_name: Some(name.into()),
            ..Self::new(SqlType::Unknown)
        }
    }

    /// Bounded `VarChar(length)`.
    #[must_use]
    pub fn varchar(length: u32) -> Self {
        Self::new(SqlType::VarChar).with_length(length)
    }

    /// `Decimal(precision, scale)`.
    #[must_use]
    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self::new(SqlType::Decimal).with_precision(precision, scale)
    }

    /// Sets the length facet.
    #[must_use]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Returns whether every value of `self` survives conversion to `target`.
    ///
    /// Integer widening, length or precision growth, bounded to unbounded
    /// text or binary, integer to a wide enough decimal, float to double and
    /// date to datetime are safe. Everything else may lose data.
    #[must_use]
    pub fn converts_safely_to(&self, target: &Self) -> bool {
        if self == target {
            return true;
        }
        let (old, new) = (self.type_code, target.type_code);
        if let (Some(from), Some(to)) = (old.integer_width(), new.integer_width()) {
            return from <= to;
        }
        match (old, new) {
            (from, SqlType::Decimal) if from.is_integer() => {
                let digits = from.integer_digits().unwrap_or(u8::MAX);
                let integral = target
                    .precision
                    .map(|p| p.saturating_sub(target.scale.unwrap_or(0)));
                integral.is_none_or(|available| available >= digits)
            }
            (SqlType::Decimal, SqlType::Decimal) => {
                let old_scale = self.scale.unwrap_or(0);
                let new_scale = target.scale.unwrap_or(0);
                let old_integral = self.precision.map(|p| p.saturating_sub(old_scale));
                let new_integral = target.precision.map(|p| p.saturating_sub(new_scale));
                let integral_fits = match (old_integral, new_integral) {
                    (_, None) => true,
                    (None, Some(_)) => false,
                    (Some(o), Some(n)) => n >= o,
                };
                new_scale >= old_scale && integral_fits
            }
            (SqlType::Float, SqlType::Double) | (SqlType::Date, SqlType::DateTime) => true,
            (SqlType::VarCharMax, to) | (SqlType::VarBinaryMax, to)
                if !matches!(to, SqlType::VarCharMax | SqlType::VarBinaryMax) =>
            {
                false
            }
            (SqlType::Char | SqlType::VarChar, SqlType::VarCharMax)
            | (SqlType::Binary | SqlType::VarBinary, SqlType::VarBinaryMax) => true,
            (SqlType::Char, SqlType::Char | SqlType::VarChar)
            | (SqlType::VarChar, SqlType::VarChar)
            | (SqlType::Binary, SqlType::Binary | SqlType::VarBinary)
            | (SqlType::VarBinary, SqlType::VarBinary) => {
                length_fits(self.length, target.length)
            }
            _ => false,
        }
    }
}

fn length_fits(old: Option<u32>, new: Option<u32>) -> bool {
    match (old, new) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(o), Some(n)) => n >= o,
    }
}

impl From<SqlType> for SqlValueType {
    fn from(type_code: SqlType) -> Self {
        Self::new(type_code)
    }
}

impl fmt::Display for SqlValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_name {
            Some(name) if self.type_code == SqlType::Unknown => f.write_str(name)?,
            _ => f.write_str(self.type_code.as_str())?,
        }
        match (self.length, self.precision, self.scale) {
            (Some(length), _, _) => write!(f, "({length})"),
            (None, Some(precision), Some(scale)) => write!(f, "({precision},{scale})"),
            (None, Some(precision), None) => write!(f, "({precision})"),
            _ => Ok(()),
        }
    }
}
