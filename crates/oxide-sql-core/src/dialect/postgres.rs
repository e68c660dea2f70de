//! PostgreSQL dialect.

use super::generic::{custom, exact, sized};
use super::{
    ansi, Dialect, DialectKind, Feature, FeatureSet, LimitClause, ServerVersion,
};
use crate::ast::{DateTimePart, SqlExpression, SqlFunction, SqlLiteral};
use crate::compiler::{lower, temporal, CompileError, Result};
use crate::model::{Collation, QualifiedName, SqlType, SqlValueType};

const BASE: &[Feature] = &[
    Feature::Schemas,
    Feature::BooleanType,
    Feature::ArrayLiteral,
    Feature::Sequences,
    Feature::RenameColumn,
    Feature::DropColumn,
    Feature::AlterColumn,
    Feature::AlterConstraints,
    Feature::DeferrableConstraints,
    Feature::CascadeDrop,
    Feature::MultiRowValues,
    Feature::FilteredIndexes,
    Feature::ExpressionIndexes,
    Feature::IndexFillFactor,
    Feature::TemporaryTables,
    Feature::MathFunctions,
    Feature::DateTimeOffset,
    Feature::IntervalType,
    Feature::MoveTable,
];

const DELTAS: &[(ServerVersion, &[Feature])] = &[
    (ServerVersion::new(9, 1, 0), &[Feature::Collations]),
    (ServerVersion::new(10, 0, 0), &[Feature::IdentityColumns]),
];

/// PostgreSQL dialect.
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    version: ServerVersion,
    features: FeatureSet,
}

impl PostgresDialect {
    /// Creates the dialect for a server version.
    #[must_use]
    pub fn new(version: ServerVersion) -> Self {
        Self {
            version,
            features: FeatureSet::for_version(version, BASE, DELTAS),
        }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new(DialectKind::PostgreSql.default_version())
    }
}

fn interval(unit: &str) -> SqlExpression {
    SqlExpression::native(format!("interval '1 {unit}'"))
}

/// `value + count * interval '1 unit'`.
fn add_units(value: &SqlExpression, count: &SqlExpression, unit: &str) -> SqlExpression {
    value.clone().add(count.clone().mul(interval(unit)))
}

fn to_char(value: &SqlExpression, format: &str) -> SqlExpression {
    SqlExpression::user_function("To_Char", vec![value.clone(), SqlExpression::literal(format)])
}

fn with_offset() -> SqlValueType {
    SqlValueType::new(SqlType::DateTimeOffset)
}

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn version(&self) -> ServerVersion {
        self.version
    }

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn literal(&self, value: &SqlLiteral) -> Result<String> {
        match value {
            SqlLiteral::Binary(bytes) => Ok(format!("'\\x{}'::bytea", ansi::hex(bytes))),
            SqlLiteral::Guid(text) => Ok(format!("{}::uuid", ansi::string_literal(text)?)),
            _ => ansi::literal(self, value),
        }
    }

    fn type_name(&self, data_type: &SqlValueType) -> Result<String> {
        Ok(match data_type.type_code {
            SqlType::Boolean => "boolean".to_string(),
            SqlType::Int8 | SqlType::Int16 => "smallint".to_string(),
            SqlType::Int32 => "integer".to_string(),
            SqlType::Int64 => "bigint".to_string(),
            SqlType::Decimal => exact("numeric", data_type),
            SqlType::Float => "real".to_string(),
            SqlType::Double => "double precision".to_string(),
            SqlType::Char => sized("char", data_type.length),
            SqlType::VarChar => sized("varchar", data_type.length),
            SqlType::VarCharMax => "text".to_string(),
            SqlType::Binary | SqlType::VarBinary | SqlType::VarBinaryMax => "bytea".to_string(),
            SqlType::Date => "date".to_string(),
            SqlType::Time => "time".to_string(),
            SqlType::DateTime => "timestamp".to_string(),
            SqlType::DateTimeOffset => "timestamptz".to_string(),
            SqlType::Interval => "interval".to_string(),
            SqlType::Guid => "uuid".to_string(),
            SqlType::Unknown => custom(self, data_type)?,
        })
    }

    fn lower(&self, expression: &SqlExpression) -> Result<Option<SqlExpression>> {
        use SqlFunction as F;

        let SqlExpression::Function { function, args } = expression else {
            return lower::standard(self, expression);
        };
        Ok(Some(match (function, args.as_slice()) {
            (F::DateTimeConstruct, [year, month, day]) => {
                let epoch = SqlExpression::literal(SqlLiteral::DateTime(temporal::epoch()));
                let epoch = add_units(
                    &epoch,
                    &year.clone().sub(SqlExpression::literal(temporal::EPOCH_YEAR)),
                    "year",
                );
                let epoch = add_units(&epoch, &month.clone().sub(SqlExpression::literal(1)), "month");
                add_units(&epoch, &day.clone().sub(SqlExpression::literal(1)), "day")
            }
            (F::DateTimeAddYears, [value, count]) => add_units(value, count, "year"),
            (F::DateTimeAddMonths, [value, count]) => add_units(value, count, "month"),
            (F::DateTimeAddDays, [value, count]) => add_units(value, count, "day"),
            (F::DateTimeOffsetAddYears, [value, count]) => {
                add_units(value, count, "year").cast(with_offset())
            }
            (F::DateTimeOffsetAddMonths, [value, count]) => {
                add_units(value, count, "month").cast(with_offset())
            }
            (F::DateTimeTruncate, [value]) => SqlExpression::user_function(
                "date_trunc",
                vec![SqlExpression::literal("day"), value.clone()],
            ),
            (F::DateTimeToStringIso, [value]) => to_char(value, "YYYY-MM-DD\"T\"HH24:MI:SS"),
            (F::DateTimeOffsetConstruct | F::DateTimeToDateTimeOffset, [value, offset]) => {
                SqlExpression::function(
                    F::Concat,
                    vec![
                        to_char(value, "YYYY-MM-DD\"T\"HH24:MI:SS.MS"),
                        SqlExpression::literal(" "),
                        temporal::zone_expression(offset.clone()),
                    ],
                )
                .cast(with_offset())
            }
            (F::IntervalConstruct, [nanos]) => nanos
                .clone()
                .div(SqlExpression::native("1000000000.0"))
                .mul(interval("second")),
            _ => return lower::standard(self, expression),
        }))
    }

    fn in_array(&self, operand: &str, items: &[String], negated: bool) -> Result<String> {
        let array = format!("ARRAY[{}]", items.join(", "));
        Ok(if negated {
            format!("{operand} <> ALL ({array})")
        } else {
            format!("{operand} = ANY ({array})")
        })
    }

    fn function(&self, function: SqlFunction, args: &[String]) -> Result<String> {
        use SqlFunction as F;

        Ok(match function {
            F::Rand => "random()".to_string(),
            F::NewGuid => "gen_random_uuid()".to_string(),
            F::LastAutoGeneratedId => "lastval()".to_string(),
            F::Log10 => ansi::call("LOG", args),
            F::DateTimeOffsetToUtcDateTime => format!("({} AT TIME ZONE 'UTC')", args[0]),
            F::DateTimeOffsetToLocalDateTime => format!("CAST({} AS timestamp)", args[0]),
            F::IntervalToMilliseconds => format!("(EXTRACT(EPOCH FROM {}) * 1000)", args[0]),
            F::IntervalToNanoseconds => {
                format!("CAST(EXTRACT(EPOCH FROM {}) * 1000000000 AS bigint)", args[0])
            }
            F::IntervalAbs => format!(
                "(CASE WHEN {0} < interval '0' THEN -{0} ELSE {0} END)",
                args[0]
            ),
            _ => return ansi::function(self, function, args),
        })
    }

    fn next_value(&self, sequence: &QualifiedName) -> Result<String> {
        let name = ansi::string_literal(&self.qualified_name(sequence))?;
        Ok(format!("nextval({name})"))
    }

    fn extract(&self, part: DateTimePart, operand: &str) -> Result<String> {
        Ok(match part {
            DateTimePart::Second => format!("TRUNC(EXTRACT(SECOND FROM {operand}))"),
            DateTimePart::Millisecond => {
                format!("(CAST(EXTRACT(MILLISECONDS FROM {operand}) AS integer) % 1000)")
            }
            _ => format!("EXTRACT({} FROM {operand})", part.as_str()),
        })
    }

    fn limit_clause(
        &self,
        limit: Option<&str>,
        offset: Option<&str>,
        _ordered: bool,
    ) -> Result<LimitClause> {
        Ok(ansi::limit_offset(limit, offset, "ALL"))
    }

    fn temporary_table_name(&self, name: &QualifiedName, _is_global: bool) -> String {
        self.quote_identifier(&name.name)
    }

    fn temporary_table(&self, _is_global: bool, preserve_rows: bool) -> Result<(String, String)> {
        Ok((
            "CREATE TEMPORARY TABLE".to_string(),
            ansi::on_commit(preserve_rows),
        ))
    }

    fn create_collation(&self, name: &str, collation: &Collation) -> Result<String> {
        self.require(Feature::Collations, "collations")?;
        let source = collation.source.as_deref().ok_or_else(|| {
            CompileError::InvalidNode(format!("collation {name} needs a source"))
        })?;
        Ok(format!(
            "CREATE COLLATION {name} FROM {}",
            self.quote_identifier(source)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SqlSelect, SqlTableRef};
    use crate::compiler::SqlCompiler;
    use crate::model::{SequenceDescriptor, TableColumn};

    fn render(expression: &SqlExpression) -> String {
        let dialect = PostgresDialect::default();
        SqlCompiler::new(&dialect)
            .compile_expression(expression)
            .unwrap()
            .text
    }

    #[test]
    fn test_placeholders_are_numbered() {
        let users = SqlTableRef::new(QualifiedName::new("public", "users"));
        let query = SqlSelect::from_source(users.clone())
            .filter(
                users
                    .column("a")
                    .eq(SqlExpression::parameter(1))
                    .and(users.column("b").eq(SqlExpression::parameter(2))),
            )
            .limit(10);
        let dialect = PostgresDialect::default();
        let command = SqlCompiler::new(&dialect).compile(&query.into()).unwrap();
        assert_eq!(
            command.text,
            r#"SELECT * FROM "public"."users" WHERE "users"."a" = $1 AND "users"."b" = $2 LIMIT 10"#
        );
        assert_eq!(command.parameters[1].value, Some(SqlLiteral::Integer(2)));
    }

    #[test]
    fn test_date_construct_uses_intervals() {
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
            "TIMESTAMP '2001-01-01 00:00:00' + (2005 - 2001) * interval '1 year' + (3 - 1) * interval '1 month' + (10 - 1) * interval '1 day'"
        );
    }

    #[test]
    fn test_temporal_functions() {
        let at = SqlExpression::column("at");
        assert_eq!(
            render(&SqlExpression::function(SqlFunction::DateTimeTruncate, vec![at.clone()])),
            r#"date_trunc('day', "at")"#
        );
        assert_eq!(
            render(&SqlExpression::function(SqlFunction::DateTimeToStringIso, vec![at.clone()])),
            r#"To_Char("at", 'YYYY-MM-DD"T"HH24:MI:SS')"#
        );
        assert_eq!(
            render(&SqlExpression::function(
                SqlFunction::DateTimeOffsetConstruct,
                vec![at, SqlExpression::literal(-90)]
            )),
            r#"CAST((To_Char("at", 'YYYY-MM-DD"T"HH24:MI:SS.MS') || ' ' || '-01:30') AS timestamptz)"#
        );
        assert_eq!(
            render(&SqlExpression::function(
                SqlFunction::IntervalConstruct,
                vec![SqlExpression::column("n")]
            )),
            r#""n" / 1000000000.0 * interval '1 second'"#
        );
    }

    #[test]
    fn test_array_membership() {
        let test = SqlExpression::column("id")
            .not_in_array(vec![SqlLiteral::Integer(1), SqlLiteral::Integer(2)]);
        assert_eq!(render(&test), r#""id" <> ALL (ARRAY[1, 2])"#);
    }

    #[test]
    fn test_misc_renderings() {
        assert_eq!(
            render(&SqlExpression::function(SqlFunction::Rand, Vec::new())),
            "random()"
        );
        assert_eq!(
            render(&SqlExpression::function(
                SqlFunction::NextValue,
                vec![SqlExpression::literal("public.seq")]
            )),
            r#"nextval('"public"."seq"')"#
        );
        assert_eq!(
            render(&SqlExpression::literal(SqlLiteral::Binary(vec![0xAB, 0x01]))),
            r"'\xAB01'::bytea"
        );
    }

    #[test]
    fn test_identity_depends_on_version() {
        let column = TableColumn::new("id", SqlType::Int32)
            .identity(SequenceDescriptor::new(1, 1))
            .not_null();
        let modern = PostgresDialect::new(ServerVersion::new(12, 0, 0));
        assert_eq!(
            modern
                .identity_clause(column.identity.as_ref().unwrap())
                .as_deref(),
            Ok("GENERATED BY DEFAULT AS IDENTITY (START WITH 1 INCREMENT BY 1)")
        );
        let legacy = PostgresDialect::new(ServerVersion::new(9, 6, 0));
        assert!(legacy
            .identity_clause(column.identity.as_ref().unwrap())
            .is_err());
    }
}
