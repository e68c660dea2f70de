//! ANSI renderings shared by every dialect.
//!
//! Dialect hooks default to these functions, and dialect overrides call
//! them for the cases they do not change.

use core::fmt::Write as _;

use tracing::debug;

use super::{CreateIndexSql, Dialect, Feature, LimitClause};
use crate::ast::{BinaryOperator, SqlFunction, SqlHint, SqlLiteral};
use crate::compiler::{CompileError, Result, PARAMETER_MARK};
use crate::model::SequenceDescriptor;

/// Renders `NAME(a, b, ...)`.
#[must_use]
pub fn call(name: &str, args: &[String]) -> String {
    format!("{name}({})", args.join(", "))
}

/// Quotes a string constant, doubling embedded quotes.
pub fn string_literal(value: &str) -> Result<String> {
    if value.contains(PARAMETER_MARK) {
        return Err(CompileError::InvalidNode(
            "string literal contains a reserved control character".to_string(),
        ));
    }
    Ok(format!("'{}'", value.replace('\'', "''")))
}

/// Checks decimal text: an optional sign, digits and at most one point.
pub fn decimal_literal(text: &str) -> Result<String> {
    let digits = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let valid = !(whole.is_empty() && fraction.is_empty())
        && whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit());
    if valid {
        Ok(text.to_string())
    } else {
        Err(CompileError::InvalidNode(format!(
            "'{}' is not a decimal number",
            text.escape_debug()
        )))
    }
}

/// Upper-case hexadecimal digits of `bytes`.
#[must_use]
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}

/// Renders a floating point constant, rejecting NaN and infinities.
pub fn double_literal<D: Dialect + ?Sized>(dialect: &D, value: f64) -> Result<String> {
    if value.is_finite() {
        Ok(format!("{value:?}"))
    } else {
        Err(CompileError::unsupported(
            dialect.name(),
            format!("non-finite number {value}"),
        ))
    }
}

/// ANSI literal rendering.
pub fn literal<D: Dialect + ?Sized>(dialect: &D, value: &SqlLiteral) -> Result<String> {
    Ok(match value {
        SqlLiteral::Null => "NULL".to_string(),
        SqlLiteral::Boolean(b) => boolean(dialect, *b).to_string(),
        SqlLiteral::Integer(i) => i.to_string(),
        SqlLiteral::Double(d) => double_literal(dialect, *d)?,
        SqlLiteral::Decimal(text) => decimal_literal(text)?,
        SqlLiteral::String(s) | SqlLiteral::Guid(s) => string_literal(s)?,
        SqlLiteral::Binary(bytes) => format!("X'{}'", hex(bytes)),
        SqlLiteral::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
        SqlLiteral::Time(t) => format!("TIME '{}'", t.format("%H:%M:%S%.f")),
        SqlLiteral::DateTime(dt) => format!("TIMESTAMP '{}'", dt.format("%Y-%m-%d %H:%M:%S%.f")),
        SqlLiteral::DateTimeOffset(dt) => {
            dialect.require(Feature::DateTimeOffset, "datetime offset values")?;
            format!(
                "TIMESTAMP WITH TIME ZONE '{}'",
                dt.format("%Y-%m-%d %H:%M:%S%.f %:z")
            )
        }
        SqlLiteral::Interval(nanos) => {
            if dialect.supports(Feature::IntervalType) {
                format!("INTERVAL '{}' SECOND", seconds(*nanos))
            } else {
                nanos.to_string()
            }
        }
    })
}

/// Boolean constant: `TRUE`/`FALSE` with a boolean type, `1`/`0` otherwise.
#[must_use]
pub fn boolean<D: Dialect + ?Sized>(dialect: &D, value: bool) -> &'static str {
    match (dialect.supports(Feature::BooleanType), value) {
        (true, true) => "TRUE",
        (true, false) => "FALSE",
        (false, true) => "1",
        (false, false) => "0",
    }
}

/// Nanoseconds as a decimal number of seconds.
#[must_use]
pub fn seconds(nanos: i64) -> String {
    let sign = if nanos < 0 { "-" } else { "" };
    let abs = nanos.unsigned_abs();
    let (whole, fraction) = (abs / 1_000_000_000, abs % 1_000_000_000);
    if fraction == 0 {
        format!("{sign}{whole}")
    } else {
        let digits = format!("{fraction:09}");
        format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

/// ANSI infix rendering.
pub fn binary<D: Dialect + ?Sized>(
    _dialect: &D,
    op: BinaryOperator,
    left: &str,
    right: &str,
) -> Result<String> {
    Ok(format!("{left} {} {right}", op.as_str()))
}

/// Adds `count` units to `operand` with interval arithmetic.
#[must_use]
pub fn add_interval(operand: &str, count: &str, unit: &str) -> String {
    format!("({operand} + INTERVAL '1' {unit} * ({count}))")
}

fn pad(name: &str, args: &[String]) -> String {
    let (value, length) = (&args[0], &args[1]);
    let filler = args.get(2).map_or("' '", String::as_str);
    format!(
        "CASE WHEN CHAR_LENGTH({value}) >= {length} THEN {value} ELSE {name}({value}, {length}, {filler}) END"
    )
}

/// ANSI function rendering.
///
/// The compiler has already checked argument counts against
/// [`SqlFunction::arity`].
pub fn function<D: Dialect + ?Sized>(
    dialect: &D,
    function: SqlFunction,
    args: &[String],
) -> Result<String> {
    use SqlFunction as F;

    let unsupported = || Err(CompileError::unsupported(dialect.name(), function.as_str()));
    let math = |name: &str| -> Result<String> {
        dialect.require(Feature::MathFunctions, function.as_str())?;
        Ok(call(name, args))
    };
    Ok(match function {
        F::Abs => call("ABS", args),
        F::Ceiling => call("CEILING", args),
        F::Floor => call("FLOOR", args),
        F::Power => call("POWER", args),
        F::Round => call("ROUND", args),
        F::Sign => call("SIGN", args),
        F::Sqrt => math("SQRT")?,
        F::Acos => math("ACOS")?,
        F::Asin => math("ASIN")?,
        F::Atan => math("ATAN")?,
        F::Atan2 => math("ATAN2")?,
        F::Cos => math("COS")?,
        F::Cot => math("COT")?,
        F::Degrees => math("DEGREES")?,
        F::Exp => math("EXP")?,
        F::Log => math("LN")?,
        F::Log10 => math("LOG10")?,
        F::Pi => math("PI")?,
        F::Radians => math("RADIANS")?,
        F::Sin => math("SIN")?,
        F::Tan => math("TAN")?,
        F::Truncate => call("TRUNC", args),
        F::CharLength => call("CHAR_LENGTH", args),
        F::BinaryLength => call("OCTET_LENGTH", args),
        F::Concat => format!("({})", args.join(" || ")),
        F::Lower => call("LOWER", args),
        F::Upper => call("UPPER", args),
        F::Substring => match args {
            [value, start] => format!("SUBSTRING({value} FROM {start})"),
            [value, start, length, ..] => format!("SUBSTRING({value} FROM {start} FOR {length})"),
            _ => return unsupported(),
        },
        F::Position => format!("POSITION({} IN {})", args[0], args[1]),
        F::Replace => call("REPLACE", args),
        F::Trim => format!("TRIM({})", args[0]),
        F::LTrim => format!("TRIM(LEADING FROM {})", args[0]),
        F::RTrim => format!("TRIM(TRAILING FROM {})", args[0]),
        F::PadLeft => pad("LPAD", args),
        F::PadRight => pad("RPAD", args),
        F::Left => call("LEFT", args),
        F::Right => call("RIGHT", args),
        F::Coalesce => call("COALESCE", args),
        F::NullIf => call("NULLIF", args),
        F::CurrentUser => "CURRENT_USER".to_string(),
        F::SessionUser => "SESSION_USER".to_string(),
        F::SystemUser => "SYSTEM_USER".to_string(),
        F::CurrentDate => "CURRENT_DATE".to_string(),
        F::CurrentTime => "CURRENT_TIME".to_string(),
        F::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
        F::CurrentDateTimeOffset => {
            dialect.require(Feature::DateTimeOffset, function.as_str())?;
            "CURRENT_TIMESTAMP".to_string()
        }
        F::DateTimeTruncate => format!("CAST(CAST({} AS DATE) AS TIMESTAMP)", args[0]),
        F::DateTimeAddYears | F::DateTimeOffsetAddYears => add_interval(&args[0], &args[1], "YEAR"),
        F::DateTimeAddMonths | F::DateTimeOffsetAddMonths => {
            add_interval(&args[0], &args[1], "MONTH")
        }
        F::DateTimeAddDays => add_interval(&args[0], &args[1], "DAY"),
        F::DateTimeOffsetTimeOfDay => format!("CAST({} AS TIME)", args[0]),
        F::IntervalConstruct if dialect.supports(Feature::IntervalType) => {
            format!("(INTERVAL '1' SECOND * ({} / 1000000000.0))", args[0])
        }
        F::IntervalConstruct | F::IntervalToNanoseconds
            if !dialect.supports(Feature::IntervalType) =>
        {
            format!("({})", args[0])
        }
        F::IntervalToMilliseconds if !dialect.supports(Feature::IntervalType) => {
            format!("(({}) / 1000000)", args[0])
        }
        F::IntervalAbs if !dialect.supports(Feature::IntervalType) => call("ABS", args),
        F::IntervalNegate => format!("(-({}))", args[0]),
        F::Rand
        | F::Square
        | F::LastAutoGeneratedId
        | F::NextValue
        | F::NewGuid
        | F::DateTimeConstruct
        | F::DateTimeToStringIso
        | F::DateTimeToDateTimeOffset
        | F::DateTimeOffsetConstruct
        | F::DateTimeOffsetToUtcDateTime
        | F::DateTimeOffsetToLocalDateTime
        | F::IntervalConstruct
        | F::IntervalToMilliseconds
        | F::IntervalToNanoseconds
        | F::IntervalAbs => return unsupported(),
    })
}

/// `OFFSET n ROWS FETCH FIRST m ROWS ONLY`.
#[must_use]
pub fn fetch_first(limit: Option<&str>, offset: Option<&str>) -> LimitClause {
    let mut parts = Vec::new();
    if let Some(offset) = offset {
        parts.push(format!("OFFSET {offset} ROWS"));
    }
    if let Some(limit) = limit {
        parts.push(format!("FETCH FIRST {limit} ROWS ONLY"));
    }
    if parts.is_empty() {
        LimitClause::Omitted
    } else {
        LimitClause::Tail(parts.join(" "))
    }
}

/// `LIMIT m OFFSET n`.
#[must_use]
pub fn limit_offset(limit: Option<&str>, offset: Option<&str>, unlimited: &str) -> LimitClause {
    match (limit, offset) {
        (None, None) => LimitClause::Omitted,
        (Some(limit), None) => LimitClause::Tail(format!("LIMIT {limit}")),
        (limit, Some(offset)) => LimitClause::Tail(format!(
            "LIMIT {} OFFSET {offset}",
            limit.unwrap_or(unlimited)
        )),
    }
}

/// Logs and drops hints an engine cannot express. Hints are advisory.
pub fn skip_hints<D: Dialect + ?Sized>(dialect: &D, hints: &[SqlHint]) {
    for hint in hints {
        debug!(dialect = dialect.name(), ?hint, "Skipping optimizer hint");
    }
}

/// `GENERATED BY DEFAULT AS IDENTITY (START WITH s INCREMENT BY i)`.
#[must_use]
pub fn generated_identity(descriptor: &SequenceDescriptor) -> String {
    let options = sequence_options(descriptor, false);
    if options.is_empty() {
        "GENERATED BY DEFAULT AS IDENTITY".to_string()
    } else {
        format!("GENERATED BY DEFAULT AS IDENTITY ({options})")
    }
}

/// Sequence options in `START WITH ... CYCLE` form.
///
/// With `restart`, the start value renders as `RESTART WITH` for
/// `ALTER SEQUENCE`.
#[must_use]
pub fn sequence_options(descriptor: &SequenceDescriptor, restart: bool) -> String {
    let mut parts = Vec::new();
    if let Some(start) = descriptor.start_value {
        let keyword = if restart { "RESTART WITH" } else { "START WITH" };
        parts.push(format!("{keyword} {start}"));
    }
    if let Some(increment) = descriptor.increment {
        parts.push(format!("INCREMENT BY {increment}"));
    }
    if let Some(min) = descriptor.min_value {
        parts.push(format!("MINVALUE {min}"));
    }
    if let Some(max) = descriptor.max_value {
        parts.push(format!("MAXVALUE {max}"));
    }
    match descriptor.is_cyclic {
        Some(true) => parts.push("CYCLE".to_string()),
        Some(false) => parts.push("NO CYCLE".to_string()),
        None => {}
    }
    parts.join(" ")
}

/// `CREATE [UNIQUE] INDEX name ON table (keys)` with optional fill factor
/// and filter. `fill_factor_first` puts the `WITH` clause before `WHERE`.
pub fn create_index<D: Dialect + ?Sized>(
    dialect: &D,
    sql: &CreateIndexSql<'_>,
    fill_factor_first: bool,
) -> Result<String> {
    if sql.keys.is_empty() {
        return Err(CompileError::InvalidNode(format!(
            "index {} has no keys",
            sql.name
        )));
    }
    if sql.keys.iter().any(|key| key.is_expression) {
        dialect.require(Feature::ExpressionIndexes, "expression indexes")?;
    }
    if sql.filter.is_some() {
        dialect.require(Feature::FilteredIndexes, "filtered indexes")?;
    }
    if sql.clustered {
        dialect.require(Feature::ClusteredIndexes, "clustered indexes")?;
    }
    if sql.fill_factor.is_some() {
        dialect.require(Feature::IndexFillFactor, "index fill factor")?;
    }
    let keys = sql
        .keys
        .iter()
        .map(|key| {
            let text = if key.is_expression {
                format!("({})", key.text)
            } else {
                key.text.clone()
            };
            if key.descending {
                format!("{text} DESC")
            } else {
                text
            }
        })
        .collect::<Vec<_>>();
    let mut text = String::from("CREATE");
    if sql.unique {
        text.push_str(" UNIQUE");
    }
    if sql.clustered {
        text.push_str(" CLUSTERED");
    }
    let _ = write!(
        text,
        " INDEX {} ON {} ({})",
        sql.name,
        sql.table,
        keys.join(", ")
    );
    let with = sql
        .fill_factor
        .map(|fill| format!(" WITH (FILLFACTOR = {fill})"))
        .unwrap_or_default();
    let filter = sql
        .filter
        .map(|filter| format!(" WHERE {filter}"))
        .unwrap_or_default();
    if fill_factor_first {
        text.push_str(&with);
        text.push_str(&filter);
    } else {
        text.push_str(&filter);
        text.push_str(&with);
    }
    Ok(text)
}

/// `ON COMMIT PRESERVE ROWS` or `ON COMMIT DELETE ROWS`, with a leading space.
#[must_use]
pub fn on_commit(preserve_rows: bool) -> String {
    if preserve_rows {
        " ON COMMIT PRESERVE ROWS".to_string()
    } else {
        " ON COMMIT DELETE ROWS".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::GenericDialect;

    #[test]
    fn test_string_literal_escaping() {
        assert_eq!(string_literal("it's").as_deref(), Ok("'it''s'"));
        assert!(string_literal("\u{1}").is_err());
    }

    #[test]
    fn test_decimal_text_is_checked() {
        for text in ["12.50", "-3", "+.5", "7."] {
            assert_eq!(decimal_literal(text).as_deref(), Ok(text));
        }
        for text in ["", ".", "1.2.3", "1e5", "12; DROP TABLE t", "--1"] {
            assert!(decimal_literal(text).is_err(), "{text:?}");
        }
    }

    #[test]
    fn test_seconds() {
        assert_eq!(seconds(1_500_000_000), "1.5");
        assert_eq!(seconds(-2_000_000_000), "-2");
        assert_eq!(seconds(1), "0.000000001");
    }

    #[test]
    fn test_pad_keeps_longer_values() {
        let rendered = function(
            &GenericDialect::new(),
            SqlFunction::PadLeft,
            &["x".to_string(), "5".to_string()],
        );
        assert_eq!(
            rendered.as_deref(),
            Ok("CASE WHEN CHAR_LENGTH(x) >= 5 THEN x ELSE LPAD(x, 5, ' ') END")
        );
    }

    #[test]
    fn test_identity_options() {
        assert_eq!(
            generated_identity(&SequenceDescriptor::new(100, 5)),
            "GENERATED BY DEFAULT AS IDENTITY (START WITH 100 INCREMENT BY 5)"
        );
        assert_eq!(
            generated_identity(&SequenceDescriptor::default()),
            "GENERATED BY DEFAULT AS IDENTITY"
        );
    }

    #[test]
    fn test_fetch_first() {
        assert_eq!(fetch_first(None, None), LimitClause::Omitted);
        assert_eq!(
            fetch_first(Some("10"), Some("20")),
            LimitClause::Tail("OFFSET 20 ROWS FETCH FIRST 10 ROWS ONLY".to_string())
        );
    }
}
