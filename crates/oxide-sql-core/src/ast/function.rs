//! Canonical function catalog.
//!
//! Functions are identified by semantic intent. Each dialect decides how
//! (or whether) it renders them; some are lowered into simpler trees first.

use core::fmt;
use core::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Vendor-neutral scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlFunction {
    // Math
    /// Absolute value.
    Abs,
    /// Arc cosine.
    Acos,
    /// Arc sine.
    Asin,
    /// Arc tangent.
    Atan,
    /// Two-argument arc tangent.
    Atan2,
    /// Smallest integer not less than the argument.
    Ceiling,
    /// Cosine.
    Cos,
    /// Cotangent.
    Cot,
    /// Radians to degrees.
    Degrees,
    /// e raised to the argument.
    Exp,
    /// Largest integer not greater than the argument.
    Floor,
    /// Natural logarithm.
    Log,
    /// Base-10 logarithm.
    Log10,
    /// The constant pi.
    Pi,
    /// Base raised to exponent.
    Power,
    /// Degrees to radians.
    Radians,
    /// Random number in `[0, 1)`.
    Rand,
    /// Round to a number of digits.
    Round,
    /// Sign of the argument.
    Sign,
    /// Sine.
    Sin,
    /// Square root.
    Sqrt,
    /// Argument times itself.
    Square,
    /// Tangent.
    Tan,
    /// Truncate toward zero.
    Truncate,

    // Strings
    /// Length in characters.
    CharLength,
    /// Length in bytes.
    BinaryLength,
    /// String concatenation of all arguments.
    Concat,
    /// Lower case.
    Lower,
    /// Upper case.
    Upper,
    /// Substring by 1-based start and optional length.
    Substring,
    /// 1-based position of the first argument in the second.
    Position,
    /// Replace all occurrences.
    Replace,
    /// Trim both ends.
    Trim,
    /// Trim the start.
    LTrim,
    /// Trim the end.
    RTrim,
    /// Left pad to a length, never truncating.
    PadLeft,
    /// Right pad to a length, never truncating.
    PadRight,
    /// Leftmost characters.
    Left,
    /// Rightmost characters.
    Right,

    // NULL handling
    /// First non-NULL argument.
    Coalesce,
    /// NULL when both arguments are equal.
    NullIf,

    // Session
    /// Current user.
    CurrentUser,
    /// Session user.
    SessionUser,
    /// System user.
    SystemUser,
    /// Last identity value generated in this session.
    LastAutoGeneratedId,
    /// Next value of the named sequence.
    NextValue,
    /// A new random unique identifier.
    NewGuid,

    // Date and time
    /// Current date.
    CurrentDate,
    /// Current time.
    CurrentTime,
    /// Current date and time.
    CurrentTimestamp,
    /// Current date and time with offset.
    CurrentDateTimeOffset,
    /// Build a date from year, month and day.
    DateTimeConstruct,
    /// Strip the time of day.
    DateTimeTruncate,
    /// Add whole years.
    DateTimeAddYears,
    /// Add whole months.
    DateTimeAddMonths,
    /// Add whole days.
    DateTimeAddDays,
    /// ISO 8601 text, `YYYY-MM-DDTHH:MI:SS`.
    DateTimeToStringIso,
    /// Attach a zone offset to a datetime.
    DateTimeToDateTimeOffset,
    /// Build a datetime with offset from a datetime and offset minutes.
    DateTimeOffsetConstruct,
    /// Time of day of a datetime with offset.
    DateTimeOffsetTimeOfDay,
    /// Add whole years to a datetime with offset.
    DateTimeOffsetAddYears,
    /// Add whole months to a datetime with offset.
    DateTimeOffsetAddMonths,
    /// The same instant in UTC.
    DateTimeOffsetToUtcDateTime,
    /// The same instant in the server's local zone.
    DateTimeOffsetToLocalDateTime,

    // Intervals
    /// Interval from a number of nanoseconds.
    IntervalConstruct,
    /// Interval length in milliseconds.
    IntervalToMilliseconds,
    /// Interval length in nanoseconds.
    IntervalToNanoseconds,
    /// Absolute interval.
    IntervalAbs,
    /// Negated interval.
    IntervalNegate,
}

impl SqlFunction {
    /// Canonical name, used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abs => "Abs",
            Self::Acos => "Acos",
            Self::Asin => "Asin",
            Self::Atan => "Atan",
            Self::Atan2 => "Atan2",
            Self::Ceiling => "Ceiling",
            Self::Cos => "Cos",
            Self::Cot => "Cot",
            Self::Degrees => "Degrees",
            Self::Exp => "Exp",
            Self::Floor => "Floor",
            Self::Log => "Log",
            Self::Log10 => "Log10",
            Self::Pi => "Pi",
            Self::Power => "Power",
            Self::Radians => "Radians",
            Self::Rand => "Rand",
            Self::Round => "Round",
            Self::Sign => "Sign",
            Self::Sin => "Sin",
            Self::Sqrt => "Sqrt",
            Self::Square => "Square",
            Self::Tan => "Tan",
            Self::Truncate => "Truncate",
            Self::CharLength => "CharLength",
            Self::BinaryLength => "BinaryLength",
            Self::Concat => "Concat",
            Self::Lower => "Lower",
            Self::Upper => "Upper",
            Self::Substring => "Substring",
            Self::Position => "Position",
            Self::Replace => "Replace",
            Self::Trim => "Trim",
            Self::LTrim => "LTrim",
            Self::RTrim => "RTrim",
            Self::PadLeft => "PadLeft",
            Self::PadRight => "PadRight",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Coalesce => "Coalesce",
            Self::NullIf => "NullIf",
            Self::CurrentUser => "CurrentUser",
            Self::SessionUser => "SessionUser",
            Self::SystemUser => "SystemUser",
            Self::LastAutoGeneratedId => "LastAutoGeneratedId",
            Self::NextValue => "NextValue",
            Self::NewGuid => "NewGuid",
            Self::CurrentDate => "CurrentDate",
            Self::CurrentTime => "CurrentTime",
            Self::CurrentTimestamp => "CurrentTimestamp",
            Self::CurrentDateTimeOffset => "CurrentDateTimeOffset",
            Self::DateTimeConstruct => "DateTimeConstruct",
            Self::DateTimeTruncate => "DateTimeTruncate",
            Self::DateTimeAddYears => "DateTimeAddYears",
            Self::DateTimeAddMonths => "DateTimeAddMonths",
            Self::DateTimeAddDays => "DateTimeAddDays",
            Self::DateTimeToStringIso => "DateTimeToStringIso",
            Self::DateTimeToDateTimeOffset => "DateTimeToDateTimeOffset",
            Self::DateTimeOffsetConstruct => "DateTimeOffsetConstruct",
            Self::DateTimeOffsetTimeOfDay => "DateTimeOffsetTimeOfDay",
            Self::DateTimeOffsetAddYears => "DateTimeOffsetAddYears",
            Self::DateTimeOffsetAddMonths => "DateTimeOffsetAddMonths",
            Self::DateTimeOffsetToUtcDateTime => "DateTimeOffsetToUtcDateTime",
            Self::DateTimeOffsetToLocalDateTime => "DateTimeOffsetToLocalDateTime",
            Self::IntervalConstruct => "IntervalConstruct",
            Self::IntervalToMilliseconds => "IntervalToMilliseconds",
            Self::IntervalToNanoseconds => "IntervalToNanoseconds",
            Self::IntervalAbs => "IntervalAbs",
            Self::IntervalNegate => "IntervalNegate",
        }
    }

    /// Accepted argument counts.
    #[must_use]
    pub const fn arity(self) -> RangeInclusive<usize> {
        match self {
            Self::Pi
            | Self::Rand
            | Self::CurrentUser
            | Self::SessionUser
            | Self::SystemUser
            | Self::LastAutoGeneratedId
            | Self::NewGuid
            | Self::CurrentDate
            | Self::CurrentTime
            | Self::CurrentTimestamp
            | Self::CurrentDateTimeOffset => 0..=0,
            Self::Atan2
            | Self::Power
            | Self::Position
            | Self::Left
            | Self::Right
            | Self::NullIf
            | Self::DateTimeAddYears
            | Self::DateTimeAddMonths
            | Self::DateTimeAddDays
            | Self::DateTimeToDateTimeOffset
            | Self::DateTimeOffsetConstruct
            | Self::DateTimeOffsetAddYears
            | Self::DateTimeOffsetAddMonths => 2..=2,
            Self::Round | Self::Truncate => 1..=2,
            Self::Substring | Self::PadLeft | Self::PadRight => 2..=3,
            Self::Replace | Self::DateTimeConstruct => 3..=3,
            Self::Concat | Self::Coalesce => 1..=usize::MAX,
            _ => 1..=1,
        }
    }
}

impl fmt::Display for SqlFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunction {
    /// Row or value count.
    Count,
    /// Sum.
    Sum,
    /// Average.
    Avg,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
}

impl AggregateFunction {
    /// SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Parts that can be extracted from temporal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateTimePart {
    /// Year.
    Year,
    /// Month of year.
    Month,
    /// Day of month.
    Day,
    /// Hour of day.
    Hour,
    /// Minute of hour.
    Minute,
    /// Second of minute.
    Second,
    /// Millisecond of second.
    Millisecond,
    /// Day of week, Sunday is 0.
    DayOfWeek,
    /// Day of year, 1-based.
    DayOfYear,
}

impl DateTimePart {
    /// ANSI `EXTRACT` field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
            Self::Millisecond => "MILLISECOND",
            Self::DayOfWeek => "DOW",
            Self::DayOfYear => "DOY",
        }
    }
}
