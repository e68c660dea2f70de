//! Date and time expression builders used when lowering temporal functions.

use chrono::{NaiveDate, NaiveDateTime};

use crate::ast::{SqlExpression, SqlFunction, SqlLiteral};
use crate::model::{SqlType, SqlValueType};

/// Year of the anchor date that date construction offsets from.
pub const EPOCH_YEAR: i64 = 2001;

/// `2001-01-01 00:00:00`.
#[must_use]
pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 1, 1)
        .unwrap_or_default()
        .and_time(chrono::NaiveTime::MIN)
}

/// Builds a date from year, month and day expressions by adding
/// `year - 2001` years, `month - 1` months and `day - 1` days to the epoch.
#[must_use]
pub fn date_construct(
    year: SqlExpression,
    month: SqlExpression,
    day: SqlExpression,
) -> SqlExpression {
    let anchor = SqlExpression::literal(SqlLiteral::DateTime(epoch()));
    let years = SqlExpression::function(
        SqlFunction::DateTimeAddYears,
        vec![anchor, year.sub(SqlExpression::literal(EPOCH_YEAR))],
    );
    let months = SqlExpression::function(
        SqlFunction::DateTimeAddMonths,
        vec![years, month.sub(SqlExpression::literal(1))],
    );
    SqlExpression::function(
        SqlFunction::DateTimeAddDays,
        vec![months, day.sub(SqlExpression::literal(1))],
    )
}

/// Formats an offset in minutes as `+HH:MM` or `-HH:MM`.
///
/// The sign follows the whole-hour part, so offsets between -59 and -1
/// minutes format with a plus sign.
#[must_use]
pub fn zone_string(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = (minutes % 60).abs();
    let sign = if hours < 0 { '-' } else { '+' };
    format!("{sign}{:02}:{rest:02}", hours.abs())
}

/// Expression producing the `+HH:MM` text of an offset in minutes.
///
/// Constant offsets fold to a string literal.
#[must_use]
pub fn zone_expression(offset: SqlExpression) -> SqlExpression {
    if let Some(minutes) = offset.as_integer() {
        return SqlExpression::literal(zone_string(minutes));
    }
    let hours = offset.clone().div(SqlExpression::literal(60));
    let minutes = offset.rem(SqlExpression::literal(60));
    let sign = SqlExpression::when(
        hours.clone().lt(SqlExpression::literal(0)),
        SqlExpression::literal("-"),
        SqlExpression::literal("+"),
    );
    SqlExpression::function(
        SqlFunction::Concat,
        vec![
            sign,
            two_digits(hours),
            SqlExpression::literal(":"),
            two_digits(minutes),
        ],
    )
}

/// `PadLeft(CAST(ABS(x) AS VARCHAR), 2, '0')`.
fn two_digits(value: SqlExpression) -> SqlExpression {
    let text = SqlExpression::function(SqlFunction::Abs, vec![value])
        .cast(SqlValueType::new(SqlType::VarChar).with_length(2));
    SqlExpression::function(
        SqlFunction::PadLeft,
        vec![text, SqlExpression::literal(2), SqlExpression::literal("0")],
    )
}
