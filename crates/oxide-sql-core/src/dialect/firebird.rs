//! Firebird dialect.
//!
//! Firebird has no schemas and a boolean type only from version 3. Row
//! limiting goes right after `SELECT` as `FIRST n SKIP m`, and indexes
//! carry a single direction for all their keys.

use super::generic::{custom, exact, sized};
use super::{
    ansi, AlterColumnSql, CreateIndexSql, Dialect, DialectKind, Feature, FeatureSet, LimitClause,
    ServerVersion,
};
use crate::ast::{BinaryOperator, DateTimePart, SqlExpression, SqlFunction, SqlLiteral};
use crate::compiler::{lower, temporal, CompileError, Result};
use crate::model::{QualifiedName, SequenceDescriptor, SqlType, SqlValueType};

const BASE: &[Feature] = &[
    Feature::Sequences,
    Feature::AlterColumn,
    Feature::AlterConstraints,
    Feature::ExpressionIndexes,
    Feature::TemporaryTables,
    Feature::Collations,
    Feature::RenameColumn,
    Feature::DropColumn,
    Feature::MathFunctions,
];

const DELTAS: &[(ServerVersion, &[Feature])] = &[
    (
        ServerVersion::new(3, 0, 0),
        &[Feature::BooleanType, Feature::IdentityColumns],
    ),
    (ServerVersion::new(4, 0, 0), &[Feature::DateTimeOffset]),
    (ServerVersion::new(5, 0, 0), &[Feature::FilteredIndexes]),
];

/// Firebird dialect.
#[derive(Debug, Clone)]
pub struct FirebirdDialect {
    version: ServerVersion,
    features: FeatureSet,
}

impl FirebirdDialect {
    /// Creates the dialect for a server version.
    #[must_use]
    pub fn new(version: ServerVersion) -> Self {
        Self {
            version,
            features: FeatureSet::for_version(version, BASE, DELTAS),
        }
    }
}

impl Default for FirebirdDialect {
    fn default() -> Self {
        Self::new(DialectKind::Firebird.default_version())
    }
}

fn date_add(value: &str, count: &str, unit: &str) -> String {
    format!("DATEADD(({count}) {unit} TO {value})")
}

impl Dialect for FirebirdDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Firebird
    }

    fn version(&self) -> ServerVersion {
        self.version
    }

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    fn literal(&self, value: &SqlLiteral) -> Result<String> {
        match value {
            SqlLiteral::DateTimeOffset(dt) => {
                self.require(Feature::DateTimeOffset, "datetime offset values")?;
                Ok(format!("TIMESTAMP '{}'", dt.format("%Y-%m-%d %H:%M:%S%.f %:z")))
            }
            SqlLiteral::Guid(uuid) => Ok(format!("CHAR_TO_UUID({})", ansi::string_literal(uuid)?)),
            _ => ansi::literal(self, value),
        }
    }

    fn type_name(&self, data_type: &SqlValueType) -> Result<String> {
        Ok(match data_type.type_code {
            SqlType::Boolean if self.supports(Feature::BooleanType) => "BOOLEAN".to_string(),
            SqlType::Boolean | SqlType::Int8 | SqlType::Int16 => "SMALLINT".to_string(),
            SqlType::Int32 => "INTEGER".to_string(),
            SqlType::Int64 | SqlType::Interval => "BIGINT".to_string(),
            SqlType::Decimal => exact("DECIMAL", data_type),
            SqlType::Float => "FLOAT".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Char => sized("CHAR", data_type.length),
            SqlType::VarChar => sized("VARCHAR", data_type.length),
            SqlType::VarCharMax => "BLOB SUB_TYPE TEXT".to_string(),
            SqlType::Binary => format!(
                "{} CHARACTER SET OCTETS",
                sized("CHAR", data_type.length)
            ),
            SqlType::VarBinary => format!(
                "{} CHARACTER SET OCTETS",
                sized("VARCHAR", data_type.length)
            ),
            SqlType::VarBinaryMax => "BLOB SUB_TYPE BINARY".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "TIMESTAMP".to_string(),
            SqlType::DateTimeOffset => {
                self.require(Feature::DateTimeOffset, "datetime offset columns")?;
                "TIMESTAMP WITH TIME ZONE".to_string()
            }
            SqlType::Guid => "CHAR(16) CHARACTER SET OCTETS".to_string(),
            SqlType::Unknown => custom(self, data_type)?,
        })
    }

    fn lower(&self, expression: &SqlExpression) -> Result<Option<SqlExpression>> {
        if let SqlExpression::Function {
            function: SqlFunction::DateTimeOffsetConstruct | SqlFunction::DateTimeToDateTimeOffset,
            args,
        } = expression
        {
            self.require(Feature::DateTimeOffset, "datetime offset values")?;
            if let [value, offset] = args.as_slice() {
                let text = SqlExpression::function(
                    SqlFunction::Concat,
                    vec![
                        value.clone().cast(SqlValueType::varchar(24)),
                        SqlExpression::literal(" "),
                        temporal::zone_expression(offset.clone()),
                    ],
                );
                return Ok(Some(text.cast(SqlValueType::new(SqlType::DateTimeOffset))));
            }
        }
        lower::standard(self, expression)
    }

    fn binary(&self, op: BinaryOperator, left: &str, right: &str) -> Result<String> {
        use BinaryOperator as B;

        Ok(match op {
            B::Modulo => format!("MOD({left}, {right})"),
            B::BitAnd => format!("BIN_AND({left}, {right})"),
            B::BitOr => format!("BIN_OR({left}, {right})"),
            B::BitXor => format!("BIN_XOR({left}, {right})"),
            B::DateTimePlusInterval | B::DateTimeOffsetPlusInterval => {
                format!("DATEADD(({right}) / 1000000 MILLISECOND TO {left})")
            }
            B::DateTimeMinusInterval | B::DateTimeOffsetMinusInterval => {
                format!("DATEADD(-({right}) / 1000000 MILLISECOND TO {left})")
            }
            B::DateTimeMinusDateTime | B::DateTimeOffsetMinusDateTimeOffset => {
                format!("(DATEDIFF(MILLISECOND, {right}, {left}) * 1000000)")
            }
            _ => return ansi::binary(self, op, left, right),
        })
    }

    fn function(&self, function: SqlFunction, args: &[String]) -> Result<String> {
        use SqlFunction as F;

        Ok(match function {
            F::Rand => "RAND()".to_string(),
            F::NewGuid => "GEN_UUID()".to_string(),
            F::DateTimeAddYears | F::DateTimeOffsetAddYears => {
                date_add(&args[0], &args[1], "YEAR")
            }
            F::DateTimeAddMonths | F::DateTimeOffsetAddMonths => {
                date_add(&args[0], &args[1], "MONTH")
            }
            F::DateTimeAddDays => date_add(&args[0], &args[1], "DAY"),
            F::DateTimeToStringIso => format!(
                "SUBSTRING(REPLACE(CAST({} AS VARCHAR(24)), ' ', 'T') FROM 1 FOR 19)",
                args[0]
            ),
            F::DateTimeOffsetToUtcDateTime => {
                self.require(Feature::DateTimeOffset, function.as_str())?;
                format!(
                    "CAST({} AT TIME ZONE 'UTC' AS TIMESTAMP WITHOUT TIME ZONE)",
                    args[0]
                )
            }
            F::DateTimeOffsetToLocalDateTime => {
                self.require(Feature::DateTimeOffset, function.as_str())?;
                format!("CAST({} AS TIMESTAMP WITHOUT TIME ZONE)", args[0])
            }
            _ => return ansi::function(self, function, args),
        })
    }

    fn extract(&self, part: DateTimePart, operand: &str) -> Result<String> {
        Ok(match part {
            DateTimePart::Second => {
                format!("CAST(FLOOR(EXTRACT(SECOND FROM {operand})) AS INTEGER)")
            }
            DateTimePart::Millisecond => {
                format!("CAST(EXTRACT(MILLISECOND FROM {operand}) AS INTEGER)")
            }
            DateTimePart::DayOfWeek => format!("EXTRACT(WEEKDAY FROM {operand})"),
            DateTimePart::DayOfYear => format!("(EXTRACT(YEARDAY FROM {operand}) + 1)"),
            _ => format!("EXTRACT({} FROM {operand})", part.as_str()),
        })
    }

    fn limit_clause(
        &self,
        limit: Option<&str>,
        offset: Option<&str>,
        _ordered: bool,
    ) -> Result<LimitClause> {
        let mut parts = Vec::new();
        if let Some(limit) = limit {
            parts.push(format!("FIRST {limit}"));
        }
        if let Some(offset) = offset {
            parts.push(format!("SKIP {offset}"));
        }
        Ok(if parts.is_empty() {
            LimitClause::Omitted
        } else {
            LimitClause::Head(parts.join(" "))
        })
    }

    fn identity_clause(&self, descriptor: &SequenceDescriptor) -> Result<String> {
        self.require(Feature::IdentityColumns, "identity columns")?;
        let options = self.sequence_options(descriptor, false)?;
        Ok(if options.is_empty() {
            "GENERATED BY DEFAULT AS IDENTITY".to_string()
        } else {
            format!("GENERATED BY DEFAULT AS IDENTITY ({options})")
        })
    }

    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    fn drop_column_keyword(&self) -> &'static str {
        "DROP"
    }

    fn rename_table(&self, _table: &QualifiedName, _new_name: &str) -> Result<String> {
        Err(CompileError::unsupported(self.name(), "table rename"))
    }

    fn rename_column(&self, table: &QualifiedName, column: &str, new_name: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} TO {}",
            self.qualified_name(table),
            self.quote_identifier(column),
            self.quote_identifier(new_name)
        ))
    }

    fn alter_column_type(&self, sql: &AlterColumnSql<'_>) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            sql.table, sql.column, sql.data_type
        ))
    }

    fn alter_column_nullability(&self, sql: &AlterColumnSql<'_>) -> Result<String> {
        if self.version < ServerVersion::new(3, 0, 0) {
            return Err(CompileError::unsupported(
                self.name(),
                "column nullability change",
            ));
        }
        let action = if sql.is_nullable {
            "DROP NOT NULL"
        } else {
            "SET NOT NULL"
        };
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} {action}",
            sql.table, sql.column
        ))
    }

    fn create_index(&self, sql: &CreateIndexSql<'_>) -> Result<String> {
        let Some(first) = sql.keys.first() else {
            return Err(CompileError::InvalidNode(format!(
                "index {} has no keys",
                sql.name
            )));
        };
        if sql.clustered {
            self.require(Feature::ClusteredIndexes, "clustered indexes")?;
        }
        if sql.fill_factor.is_some() {
            self.require(Feature::IndexFillFactor, "index fill factor")?;
        }
        if sql.keys.iter().any(|key| key.descending != first.descending) {
            return Err(CompileError::unsupported(
                self.name(),
                "indexes with mixed key directions",
            ));
        }
        let keys = if sql.keys.iter().any(|key| key.is_expression) {
            let [key] = sql.keys else {
                return Err(CompileError::unsupported(
                    self.name(),
                    "expression indexes with several keys",
                ));
            };
            format!("COMPUTED BY ({})", key.text)
        } else {
            let columns: Vec<&str> = sql.keys.iter().map(|key| key.text.as_str()).collect();
            format!("({})", columns.join(", "))
        };
        let unique = if sql.unique { "UNIQUE " } else { "" };
        let direction = if first.descending { "DESCENDING " } else { "" };
        let mut text = format!(
            "CREATE {unique}{direction}INDEX {} ON {} {keys}",
            sql.name, sql.table
        );
        if let Some(filter) = sql.filter {
            self.require(Feature::FilteredIndexes, "filtered indexes")?;
            text.push_str(" WHERE ");
            text.push_str(filter);
        }
        Ok(text)
    }

    fn sequence_options(&self, descriptor: &SequenceDescriptor, restart: bool) -> Result<String> {
        if descriptor.min_value.is_some()
            || descriptor.max_value.is_some()
            || descriptor.is_cyclic == Some(true)
        {
            return Err(CompileError::unsupported(
                self.name(),
                "sequence bounds and cycling",
            ));
        }
        let descriptor = SequenceDescriptor {
            is_cyclic: None,
            ..descriptor.clone()
        };
        Ok(ansi::sequence_options(&descriptor, restart))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SqlDdl, SqlSelect, SqlTableRef};
    use crate::compiler::SqlCompiler;
    use crate::model::{Index, IndexColumn, TableColumn};

    fn render(dialect: &FirebirdDialect, expression: &SqlExpression) -> String {
        SqlCompiler::new(dialect)
            .compile_expression(expression)
            .unwrap()
            .text
    }

    #[test]
    fn test_first_skip_goes_before_distinct() {
        let users = SqlTableRef::new(QualifiedName::new("", "USERS"));
        let mut query = SqlSelect::from_source(users.clone())
            .column(users.column("NAME"))
            .limit(10)
            .offset(20);
        query.distinct = true;
        let dialect = FirebirdDialect::default();
        let command = SqlCompiler::new(&dialect).compile(&query.into()).unwrap();
        assert_eq!(
            command.text,
            r#"SELECT FIRST 10 SKIP 20 DISTINCT "USERS"."NAME" FROM "USERS""#
        );
    }

    #[test]
    fn test_date_construct_uses_dateadd() {
        let built = SqlExpression::function(
            SqlFunction::DateTimeConstruct,
            vec![
                SqlExpression::literal(2005),
                SqlExpression::literal(3),
                SqlExpression::literal(10),
            ],
        );
        assert_eq!(
            render(&FirebirdDialect::default(), &built),
            "DATEADD((10 - 1) DAY TO DATEADD((3 - 1) MONTH TO DATEADD((2005 - 2001) YEAR TO TIMESTAMP '2001-01-01 00:00:00')))"
        );
    }

    #[test]
    fn test_operators_without_symbols() {
        let dialect = FirebirdDialect::default();
        let a = SqlExpression::column("A");
        assert_eq!(
            render(&dialect, &a.clone().rem(SqlExpression::literal(3))),
            r#"MOD("A", 3)"#
        );
        assert_eq!(
            render(
                &dialect,
                &SqlExpression::binary(BinaryOperator::BitAnd, a, SqlExpression::literal(1))
            ),
            r#"BIN_AND("A", 1)"#
        );
    }

    #[test]
    fn test_booleans_follow_version() {
        let legacy = FirebirdDialect::new(ServerVersion::new(2, 5, 0));
        assert_eq!(render(&legacy, &SqlExpression::literal(true)), "1");
        assert_eq!(
            legacy.type_name(&SqlType::Boolean.into()).as_deref(),
            Ok("SMALLINT")
        );
        let modern = FirebirdDialect::new(ServerVersion::new(3, 0, 0));
        assert_eq!(render(&modern, &SqlExpression::literal(true)), "TRUE");
    }

    #[test]
    fn test_binary_types_use_octets() {
        let dialect = FirebirdDialect::default();
        assert_eq!(
            dialect
                .type_name(&SqlValueType::new(SqlType::VarBinary).with_length(16))
                .as_deref(),
            Ok("VARCHAR(16) CHARACTER SET OCTETS")
        );
        assert_eq!(
            dialect.type_name(&SqlType::Guid.into()).as_deref(),
            Ok("CHAR(16) CHARACTER SET OCTETS")
        );
    }

    #[test]
    fn test_computed_and_descending_indexes() {
        let dialect = FirebirdDialect::default();
        let computed = SqlDdl::CreateIndex {
            table: QualifiedName::new("", "USERS"),
            index: Index::new("IX_USERS_NAME").with_column(IndexColumn::expression(
                SqlExpression::function(SqlFunction::Upper, vec![SqlExpression::column("NAME")]),
            )),
        };
        assert_eq!(
            SqlCompiler::new(&dialect).compile_ddl(&computed).unwrap().text,
            r#"CREATE INDEX "IX_USERS_NAME" ON "USERS" COMPUTED BY (UPPER("NAME"))"#
        );
        let descending = SqlDdl::CreateIndex {
            table: QualifiedName::new("", "USERS"),
            index: Index::new("IX_USERS_AGE")
                .unique()
                .with_column(IndexColumn::column("AGE").descending()),
        };
        assert_eq!(
            SqlCompiler::new(&dialect).compile_ddl(&descending).unwrap().text,
            r#"CREATE UNIQUE DESCENDING INDEX "IX_USERS_AGE" ON "USERS" ("AGE")"#
        );
    }

    #[test]
    fn test_sequence_bounds_are_rejected() {
        let dialect = FirebirdDialect::default();
        assert_eq!(
            dialect
                .sequence_options(&SequenceDescriptor::new(1, 1), false)
                .as_deref(),
            Ok("START WITH 1 INCREMENT BY 1")
        );
        assert!(dialect
            .sequence_options(&SequenceDescriptor::new(1, 1).bounded(1, 10), false)
            .is_err());
    }

    #[test]
    fn test_column_changes() {
        let dialect = FirebirdDialect::default();
        let table = QualifiedName::new("", "USERS");
        let rename = SqlDdl::alter(
            table.clone(),
            crate::ast::SqlAlterAction::RenameColumn {
                column: "NAME".to_string(),
                new_name: "FULL_NAME".to_string(),
            },
        );
        assert_eq!(
            SqlCompiler::new(&dialect).compile_ddl(&rename).unwrap().text,
            r#"ALTER TABLE "USERS" ALTER COLUMN "NAME" TO "FULL_NAME""#
        );
        let add = SqlDdl::alter(
            table,
            crate::ast::SqlAlterAction::AddColumn(TableColumn::new("AGE", SqlType::Int32)),
        );
        assert_eq!(
            SqlCompiler::new(&dialect).compile_ddl(&add).unwrap().text,
            r#"ALTER TABLE "USERS" ADD "AGE" INTEGER"#
        );
    }
}
