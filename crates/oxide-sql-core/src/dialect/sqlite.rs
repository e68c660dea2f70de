//! SQLite dialect.
//!
//! SQLite has no schemas, no boolean type and no interval type. Temporal
//! values are ISO text handled by the `datetime` family of functions and
//! intervals are nanosecond counts.

use super::generic::{custom, exact, sized};
use super::{ansi, Dialect, DialectKind, Feature, FeatureSet, LimitClause, ServerVersion};
use crate::ast::{BinaryOperator, DateTimePart, SqlExpression, SqlFunction, SqlLiteral};
use crate::compiler::{lower, temporal, Result};
use crate::model::{SqlType, SqlValueType, TableColumn};

const BASE: &[Feature] = &[
    Feature::MultiRowValues,
    Feature::FilteredIndexes,
    Feature::ExpressionIndexes,
    Feature::AutoIncrementKey,
    Feature::TemporaryTables,
];

const DELTAS: &[(ServerVersion, &[Feature])] = &[
    (ServerVersion::new(3, 25, 0), &[Feature::RenameColumn]),
    (
        ServerVersion::new(3, 35, 0),
        &[Feature::DropColumn, Feature::MathFunctions],
    ),
];

/// SQLite dialect.
#[derive(Debug, Clone)]
pub struct SqliteDialect {
    version: ServerVersion,
    features: FeatureSet,
}

impl SqliteDialect {
    /// Creates the dialect for a library version.
    #[must_use]
    pub fn new(version: ServerVersion) -> Self {
        Self {
            version,
            features: FeatureSet::for_version(version, BASE, DELTAS),
        }
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new(DialectKind::Sqlite.default_version())
    }
}

/// `datetime(value, (count) || ' unit')`.
fn shift(value: &str, count: &str, unit: &str) -> String {
    format!("datetime({value}, ({count}) || ' {unit}')")
}

/// Seconds shift by a nanosecond count.
fn shift_nanos(value: &str, nanos: &str, negate: bool) -> String {
    let sign = if negate { "-" } else { "" };
    format!("datetime({value}, ({sign}({nanos}) / 1000000000.0) || ' seconds')")
}

fn pad(value: &str, length: &str, filler: &str, left: bool) -> String {
    let padding = format!(
        "SUBSTR(REPLACE(HEX(ZEROBLOB({length})), '00', {filler}), 1, {length} - LENGTH({value}))"
    );
    let padded = if left {
        format!("{padding} || {value}")
    } else {
        format!("{value} || {padding}")
    };
    format!("CASE WHEN LENGTH({value}) >= {length} THEN {value} ELSE {padded} END")
}

fn strftime_integer(format: &str, operand: &str) -> String {
    format!("CAST(strftime('{format}', {operand}) AS INTEGER)")
}

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn version(&self) -> ServerVersion {
        self.version
    }

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    fn literal(&self, value: &SqlLiteral) -> Result<String> {
        match value {
            SqlLiteral::Date(d) => ansi::string_literal(&d.format("%Y-%m-%d").to_string()),
            SqlLiteral::Time(t) => ansi::string_literal(&t.format("%H:%M:%S%.f").to_string()),
            SqlLiteral::DateTime(dt) => {
                ansi::string_literal(&dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            SqlLiteral::DateTimeOffset(dt) => {
                ansi::string_literal(&dt.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
            }
            _ => ansi::literal(self, value),
        }
    }

    fn type_name(&self, data_type: &SqlValueType) -> Result<String> {
        Ok(match data_type.type_code {
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Int8 => "TINYINT".to_string(),
            SqlType::Int16 => "SMALLINT".to_string(),
            SqlType::Int32 => "INT".to_string(),
            SqlType::Int64 => "INTEGER".to_string(),
            SqlType::Decimal => exact("DECIMAL", data_type),
            SqlType::Float => "FLOAT".to_string(),
            SqlType::Double => "DOUBLE".to_string(),
            SqlType::Char => sized("CHAR", data_type.length),
            SqlType::VarChar => sized("VARCHAR", data_type.length),
            SqlType::VarCharMax => "TEXT".to_string(),
            SqlType::Binary => sized("BINARY", data_type.length),
            SqlType::VarBinary => sized("VARBINARY", data_type.length),
            SqlType::VarBinaryMax => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "DATETIME".to_string(),
            SqlType::DateTimeOffset => "DATETIMEOFFSET".to_string(),
            SqlType::Interval => "INTERVAL".to_string(),
            SqlType::Guid => "UUID".to_string(),
            SqlType::Unknown => custom(self, data_type)?,
        })
    }

    fn lower(&self, expression: &SqlExpression) -> Result<Option<SqlExpression>> {
        if let SqlExpression::Function {
            function: SqlFunction::DateTimeOffsetConstruct | SqlFunction::DateTimeToDateTimeOffset,
            args,
        } = expression
        {
            if let [value, offset] = args.as_slice() {
                return Ok(Some(SqlExpression::function(
                    SqlFunction::Concat,
                    vec![
                        SqlExpression::function(SqlFunction::DateTimeToStringIso, vec![value.clone()]),
                        temporal::zone_expression(offset.clone()),
                    ],
                )));
            }
        }
        lower::standard(self, expression)
    }

    fn binary(&self, op: BinaryOperator, left: &str, right: &str) -> Result<String> {
        use BinaryOperator as B;

        Ok(match op {
            B::DateTimePlusInterval | B::DateTimeOffsetPlusInterval => {
                shift_nanos(left, right, false)
            }
            B::DateTimeMinusInterval | B::DateTimeOffsetMinusInterval => {
                shift_nanos(left, right, true)
            }
            B::DateTimeMinusDateTime | B::DateTimeOffsetMinusDateTimeOffset => format!(
                "CAST((julianday({left}) - julianday({right})) * 86400000000000 AS INTEGER)"
            ),
            _ => return ansi::binary(self, op, left, right),
        })
    }

    fn function(&self, function: SqlFunction, args: &[String]) -> Result<String> {
        use SqlFunction as F;

        Ok(match function {
            F::Rand => "(random() / 18446744073709551616.0 + 0.5)".to_string(),
            F::NewGuid => "lower(hex(randomblob(16)))".to_string(),
            F::LastAutoGeneratedId => "last_insert_rowid()".to_string(),
            F::CharLength => ansi::call("LENGTH", args),
            F::BinaryLength => format!("LENGTH(CAST({} AS BLOB))", args[0]),
            F::Substring => ansi::call("SUBSTR", args),
            F::Position => format!("INSTR({}, {})", args[1], args[0]),
            F::Trim => ansi::call("TRIM", args),
            F::LTrim => ansi::call("LTRIM", args),
            F::RTrim => ansi::call("RTRIM", args),
            F::Left => format!("SUBSTR({}, 1, {})", args[0], args[1]),
            F::Right => format!("SUBSTR({}, -({}))", args[0], args[1]),
            F::PadLeft | F::PadRight => pad(
                &args[0],
                &args[1],
                args.get(2).map_or("' '", String::as_str),
                function == F::PadLeft,
            ),
            F::Truncate if args.len() == 1 => format!("CAST({} AS INTEGER)", args[0]),
            F::DateTimeAddYears | F::DateTimeOffsetAddYears => shift(&args[0], &args[1], "years"),
            F::DateTimeAddMonths | F::DateTimeOffsetAddMonths => {
                shift(&args[0], &args[1], "months")
            }
            F::DateTimeAddDays => shift(&args[0], &args[1], "days"),
            F::DateTimeTruncate => format!("datetime({}, 'start of day')", args[0]),
            F::DateTimeToStringIso => format!("strftime('%Y-%m-%dT%H:%M:%S', {})", args[0]),
            F::DateTimeOffsetTimeOfDay => format!("time({})", args[0]),
            F::CurrentDateTimeOffset => "strftime('%Y-%m-%d %H:%M:%f+00:00', 'now')".to_string(),
            _ => return ansi::function(self, function, args),
        })
    }

    fn cast(&self, operand: &str, target: &SqlValueType) -> Result<String> {
        Ok(match target.type_code {
            SqlType::Date => format!("date({operand})"),
            SqlType::Time => format!("time({operand})"),
            SqlType::DateTime => format!("datetime({operand})"),
            SqlType::Char | SqlType::VarChar | SqlType::VarCharMax => {
                format!("CAST({operand} AS TEXT)")
            }
            _ => format!("CAST({operand} AS {})", self.type_name(target)?),
        })
    }

    fn extract(&self, part: DateTimePart, operand: &str) -> Result<String> {
        Ok(match part {
            DateTimePart::Year => strftime_integer("%Y", operand),
            DateTimePart::Month => strftime_integer("%m", operand),
            DateTimePart::Day => strftime_integer("%d", operand),
            DateTimePart::Hour => strftime_integer("%H", operand),
            DateTimePart::Minute => strftime_integer("%M", operand),
            DateTimePart::Second => strftime_integer("%S", operand),
            DateTimePart::Millisecond => {
                format!("(CAST(strftime('%f', {operand}) * 1000 AS INTEGER) % 1000)")
            }
            DateTimePart::DayOfWeek => strftime_integer("%w", operand),
            DateTimePart::DayOfYear => strftime_integer("%j", operand),
        })
    }

    fn limit_clause(
        &self,
        limit: Option<&str>,
        offset: Option<&str>,
        _ordered: bool,
    ) -> Result<LimitClause> {
        Ok(ansi::limit_offset(limit, offset, "-1"))
    }

    fn temporary_table(&self, _is_global: bool, _preserve_rows: bool) -> Result<(String, String)> {
        Ok(("CREATE TEMP TABLE".to_string(), String::new()))
    }

    fn auto_increment_key(&self, _column: &TableColumn, constraint: &str) -> Result<String> {
        Ok(format!(
            "INTEGER CONSTRAINT {} PRIMARY KEY AUTOINCREMENT",
            self.quote_identifier(constraint)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SqlDdl, SqlInsert, SqlSelect, SqlTableRef};
    use crate::compiler::{CompileError, SqlCompiler};
    use crate::model::{Constraint, QualifiedName, SequenceDescriptor, Table};

    fn render(expression: &SqlExpression) -> String {
        let dialect = SqliteDialect::default();
        SqlCompiler::new(&dialect)
            .compile_expression(expression)
            .unwrap()
            .text
    }

    #[test]
    fn test_schema_is_dropped_from_names() {
        let users = SqlTableRef::new(QualifiedName::new("main", "users"));
        let query = SqlSelect::from_source(users.clone())
            .column(users.column("id"))
            .offset(5);
        let dialect = SqliteDialect::default();
        let command = SqlCompiler::new(&dialect).compile(&query.into()).unwrap();
        assert_eq!(
            command.text,
            r#"SELECT "users"."id" FROM "users" LIMIT -1 OFFSET 5"#
        );
    }

    #[test]
    fn test_date_construct_shifts_epoch() {
        let built = SqlExpression::function(
            SqlFunction::DateTimeConstruct,
            vec![
                SqlExpression::literal(2005),
                SqlExpression::literal(3),
                SqlExpression::literal(10),
            ],
        );
        assert_eq!(
            render(&built),
            "datetime(datetime(datetime('2001-01-01 00:00:00', (2005 - 2001) || ' years'), (3 - 1) || ' months'), (10 - 1) || ' days')"
        );
    }

    #[test]
    fn test_booleans_and_in_lists() {
        assert_eq!(render(&SqlExpression::literal(true)), "1");
        let test = SqlExpression::column("id")
            .in_array(vec![SqlLiteral::Integer(1), SqlLiteral::Integer(2)]);
        assert_eq!(render(&test), r#""id" IN (1, 2)"#);
    }

    #[test]
    fn test_interval_arithmetic() {
        let shifted = SqlExpression::binary(
            BinaryOperator::DateTimePlusInterval,
            SqlExpression::column("at"),
            SqlExpression::literal(SqlLiteral::Interval(1_500_000_000)),
        );
        assert_eq!(
            render(&shifted),
            r#"datetime("at", ((1500000000) / 1000000000.0) || ' seconds')"#
        );
    }

    #[test]
    fn test_pad_left() {
        let padded = SqlExpression::function(
            SqlFunction::PadLeft,
            vec![
                SqlExpression::column("code"),
                SqlExpression::literal(5),
                SqlExpression::literal("0"),
            ],
        );
        assert_eq!(
            render(&padded),
            r#"CASE WHEN LENGTH("code") >= 5 THEN "code" ELSE SUBSTR(REPLACE(HEX(ZEROBLOB(5)), '00', '0'), 1, 5 - LENGTH("code")) || "code" END"#
        );
    }

    #[test]
    fn test_autoincrement_primary_key() {
        let mut table = Table::new("users");
        table
            .add_column(
                crate::model::TableColumn::new("id", SqlType::Int64)
                    .identity(SequenceDescriptor::new(1, 1))
                    .not_null(),
            )
            .unwrap();
        table
            .add_column(crate::model::TableColumn::new("name", SqlValueType::varchar(50)))
            .unwrap();
        table
            .add_constraint(Constraint::primary_key("pk_users", &["id"]))
            .unwrap();
        let ddl = SqlDdl::CreateTable {
            schema: "main".to_string(),
            table,
        };
        let dialect = SqliteDialect::default();
        assert_eq!(
            SqlCompiler::new(&dialect).compile_ddl(&ddl).unwrap().text,
            r#"CREATE TABLE "users" ("id" INTEGER CONSTRAINT "pk_users" PRIMARY KEY AUTOINCREMENT, "name" VARCHAR(50))"#
        );
    }

    #[test]
    fn test_version_gates_column_drop() {
        let drop = SqlDdl::alter(
            QualifiedName::new("main", "users"),
            crate::ast::SqlAlterAction::DropColumn {
                column: "name".to_string(),
                cascade: false,
            },
        );
        let old = SqliteDialect::new(ServerVersion::new(3, 31, 0));
        assert!(matches!(
            SqlCompiler::new(&old).compile_ddl(&drop),
            Err(CompileError::Unsupported { .. })
        ));
        let new = SqliteDialect::new(ServerVersion::new(3, 40, 0));
        assert_eq!(
            SqlCompiler::new(&new).compile_ddl(&drop).unwrap().text,
            r#"ALTER TABLE "users" DROP COLUMN "name""#
        );
    }

    #[test]
    fn test_multi_row_insert() {
        let users = SqlTableRef::new(QualifiedName::new("main", "users"));
        let insert = SqlInsert {
            table: users,
            columns: vec!["id".to_string()],
            source: crate::ast::InsertSource::Values(vec![
                vec![SqlExpression::parameter(1)],
                vec![SqlExpression::parameter(2)],
            ]),
        };
        let dialect = SqliteDialect::default();
        let command = SqlCompiler::new(&dialect).compile(&insert.into()).unwrap();
        assert_eq!(command.text, r#"INSERT INTO "users" ("id") VALUES (?), (?)"#);
        assert_eq!(command.parameters.len(), 2);
    }
}
