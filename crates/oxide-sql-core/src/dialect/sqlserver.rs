//! Microsoft SQL Server dialect.

use core::fmt::Write as _;

use super::generic::custom;
use super::{
    ansi, AlterColumnSql, CreateIndexSql, Dialect, DialectKind, Feature, FeatureSet, LimitClause,
    ServerVersion,
};
use crate::ast::{BinaryOperator, DateTimePart, SqlFunction, SqlHint, SqlLiteral};
use crate::compiler::Result;
use crate::model::{QualifiedName, SequenceDescriptor, SqlType, SqlValueType};

const BASE: &[Feature] = &[
    Feature::Schemas,
    Feature::IdentityColumns,
    Feature::RenameColumn,
    Feature::DropColumn,
    Feature::AlterColumn,
    Feature::AlterConstraints,
    Feature::MultiRowValues,
    Feature::FilteredIndexes,
    Feature::ClusteredIndexes,
    Feature::IndexFillFactor,
    Feature::PartitionFunctions,
    Feature::TemporaryTables,
    Feature::MathFunctions,
    Feature::DateTimeOffset,
    Feature::OptimizerHints,
    Feature::MoveTable,
];

const DELTAS: &[(ServerVersion, &[Feature])] =
    &[(ServerVersion::new(11, 0, 0), &[Feature::Sequences])];

const NANOS_PER_DAY: i64 = 86_400_000_000_000;

/// SQL Server dialect.
#[derive(Debug, Clone)]
pub struct SqlServerDialect {
    version: ServerVersion,
    features: FeatureSet,
}

impl SqlServerDialect {
    /// Creates the dialect for a server version.
    #[must_use]
    pub fn new(version: ServerVersion) -> Self {
        Self {
            version,
            features: FeatureSet::for_version(version, BASE, DELTAS),
        }
    }

    fn default_constraint(&self, table_name: &str, column_name: &str) -> String {
        self.quote_identifier(&format!("DF_{table_name}_{column_name}"))
    }

    fn typed_string(&self, value: &str, type_name: &str) -> Result<String> {
        Ok(format!("CAST({} AS {type_name})", ansi::string_literal(value)?))
    }
}

impl Default for SqlServerDialect {
    fn default() -> Self {
        Self::new(DialectKind::SqlServer.default_version())
    }
}

fn sized(name: &str, length: Option<u32>, default: &str) -> String {
    match length {
        Some(length) => format!("{name}({length})"),
        None => format!("{name}({default})"),
    }
}

/// Adds a nanosecond count as whole days plus milliseconds, keeping each
/// `DATEADD` amount within `int` range.
fn add_nanos(value: &str, nanos: &str, negate: bool) -> String {
    let sign = if negate { "-" } else { "" };
    format!(
        "DATEADD(millisecond, CAST({sign}(({nanos}) % {NANOS_PER_DAY}) / 1000000 AS int), \
         DATEADD(day, CAST({sign}({nanos}) / {NANOS_PER_DAY} AS int), {value}))"
    )
}

impl Dialect for SqlServerDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn version(&self) -> ServerVersion {
        self.version
    }

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn placeholder(&self, position: usize) -> String {
        format!("@p{position}")
    }

    fn literal(&self, value: &SqlLiteral) -> Result<String> {
        match value {
            SqlLiteral::String(s) => Ok(format!("N{}", ansi::string_literal(s)?)),
            SqlLiteral::Binary(bytes) => Ok(format!("0x{}", ansi::hex(bytes))),
            SqlLiteral::Guid(uuid) => self.typed_string(uuid, "uniqueidentifier"),
            SqlLiteral::Date(d) => self.typed_string(&d.format("%Y-%m-%d").to_string(), "date"),
            SqlLiteral::Time(t) => self.typed_string(&t.format("%H:%M:%S%.f").to_string(), "time"),
            SqlLiteral::DateTime(dt) => self.typed_string(
                &dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                "datetime2",
            ),
            SqlLiteral::DateTimeOffset(dt) => self.typed_string(
                &dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string(),
                "datetimeoffset",
            ),
            _ => ansi::literal(self, value),
        }
    }

    fn type_name(&self, data_type: &SqlValueType) -> Result<String> {
        Ok(match data_type.type_code {
            SqlType::Boolean => "bit".to_string(),
            SqlType::Int8 => "tinyint".to_string(),
            SqlType::Int16 => "smallint".to_string(),
            SqlType::Int32 => "int".to_string(),
            SqlType::Int64 | SqlType::Interval => "bigint".to_string(),
            SqlType::Decimal => match data_type.precision {
                Some(precision) => {
                    format!("decimal({precision},{})", data_type.scale.unwrap_or(0))
                }
                None => "decimal".to_string(),
            },
            SqlType::Float => "real".to_string(),
            SqlType::Double => "float".to_string(),
            SqlType::Char => sized("nchar", data_type.length, "1"),
            SqlType::VarChar => sized("nvarchar", data_type.length, "4000"),
            SqlType::VarCharMax => "nvarchar(max)".to_string(),
            SqlType::Binary => sized("binary", data_type.length, "1"),
            SqlType::VarBinary => sized("varbinary", data_type.length, "8000"),
            SqlType::VarBinaryMax => "varbinary(max)".to_string(),
            SqlType::Date => "date".to_string(),
            SqlType::Time => "time".to_string(),
            SqlType::DateTime => "datetime2".to_string(),
            SqlType::DateTimeOffset => "datetimeoffset".to_string(),
            SqlType::Guid => "uniqueidentifier".to_string(),
            SqlType::Unknown => custom(self, data_type)?,
        })
    }

    fn binary(&self, op: BinaryOperator, left: &str, right: &str) -> Result<String> {
        use BinaryOperator as B;

        Ok(match op {
            B::Concat => format!("{left} + {right}"),
            B::DateTimePlusInterval | B::DateTimeOffsetPlusInterval => {
                add_nanos(left, right, false)
            }
            B::DateTimeMinusInterval | B::DateTimeOffsetMinusInterval => {
                add_nanos(left, right, true)
            }
            B::DateTimeMinusDateTime | B::DateTimeOffsetMinusDateTimeOffset => {
                format!("(DATEDIFF_BIG(millisecond, {right}, {left}) * 1000000)")
            }
            _ => return ansi::binary(self, op, left, right),
        })
    }

    fn function(&self, function: SqlFunction, args: &[String]) -> Result<String> {
        use SqlFunction as F;

        Ok(match function {
            F::Rand => "RAND()".to_string(),
            F::NewGuid => "NEWID()".to_string(),
            F::LastAutoGeneratedId => "SCOPE_IDENTITY()".to_string(),
            F::Atan2 => ansi::call("ATN2", args),
            F::Log => ansi::call("LOG", args),
            F::Truncate => format!("ROUND({}, 0, 1)", args[0]),
            F::CharLength => format!("(LEN({} + N'.') - 1)", args[0]),
            F::BinaryLength => ansi::call("DATALENGTH", args),
            F::Concat => format!("({})", args.join(" + ")),
            F::Substring => match args {
                [value, start] => format!("SUBSTRING({value}, {start}, LEN({value}))"),
                _ => ansi::call("SUBSTRING", args),
            },
            F::Position => format!("CHARINDEX({}, {})", args[0], args[1]),
            F::Trim => format!("LTRIM(RTRIM({}))", args[0]),
            F::LTrim => ansi::call("LTRIM", args),
            F::RTrim => ansi::call("RTRIM", args),
            F::PadLeft | F::PadRight => {
                let (value, length) = (&args[0], &args[1]);
                let filler = args.get(2).map_or("N' '", String::as_str);
                let padded = if function == F::PadLeft {
                    format!("RIGHT(REPLICATE({filler}, {length}) + {value}, {length})")
                } else {
                    format!("LEFT({value} + REPLICATE({filler}, {length}), {length})")
                };
                format!("CASE WHEN LEN({value}) >= {length} THEN {value} ELSE {padded} END")
            }
            F::CurrentDate => "CAST(SYSDATETIME() AS date)".to_string(),
            F::CurrentTime => "CAST(SYSDATETIME() AS time)".to_string(),
            F::CurrentTimestamp => "SYSDATETIME()".to_string(),
            F::CurrentDateTimeOffset => "SYSDATETIMEOFFSET()".to_string(),
            F::DateTimeTruncate => format!("CAST(CAST({} AS date) AS datetime2)", args[0]),
            F::DateTimeAddYears | F::DateTimeOffsetAddYears => {
                format!("DATEADD(year, {}, {})", args[1], args[0])
            }
            F::DateTimeAddMonths | F::DateTimeOffsetAddMonths => {
                format!("DATEADD(month, {}, {})", args[1], args[0])
            }
            F::DateTimeAddDays => format!("DATEADD(day, {}, {})", args[1], args[0]),
            F::DateTimeToStringIso => format!("CONVERT(nvarchar(19), {}, 126)", args[0]),
            F::DateTimeOffsetConstruct => format!("TODATETIMEOFFSET({}, {})", args[0], args[1]),
            F::DateTimeOffsetTimeOfDay => format!("CAST({} AS time)", args[0]),
            F::DateTimeOffsetToUtcDateTime => {
                format!("CAST(SWITCHOFFSET({}, 0) AS datetime2)", args[0])
            }
            F::DateTimeOffsetToLocalDateTime => format!("CAST({} AS datetime2)", args[0]),
            _ => return ansi::function(self, function, args),
        })
    }

    fn extract(&self, part: DateTimePart, operand: &str) -> Result<String> {
        Ok(match part {
            DateTimePart::DayOfWeek => {
                format!("((DATEPART(weekday, {operand}) + @@DATEFIRST - 1) % 7)")
            }
            DateTimePart::DayOfYear => format!("DATEPART(dayofyear, {operand})"),
            _ => format!("DATEPART({}, {operand})", part.as_str().to_lowercase()),
        })
    }

    fn limit_clause(
        &self,
        limit: Option<&str>,
        offset: Option<&str>,
        ordered: bool,
    ) -> Result<LimitClause> {
        Ok(match (limit, offset) {
            (None, None) => LimitClause::Omitted,
            (Some(limit), None) => LimitClause::HeadAfterDistinct(format!("TOP ({limit})")),
            (limit, Some(offset)) => {
                let mut tail = String::new();
                if !ordered {
                    tail.push_str("ORDER BY (SELECT NULL) ");
                }
                let _ = write!(tail, "OFFSET {offset} ROWS");
                if let Some(limit) = limit {
                    let _ = write!(tail, " FETCH NEXT {limit} ROWS ONLY");
                }
                LimitClause::Tail(tail)
            }
        })
    }

    fn query_hints(&self, hints: &[SqlHint]) -> Option<String> {
        let options: Vec<String> = hints
            .iter()
            .map(|hint| match hint {
                SqlHint::FastFirstRows(rows) => format!("FAST {rows}"),
                SqlHint::ForceJoinOrder => "FORCE ORDER".to_string(),
                SqlHint::Native(text) => text.clone(),
            })
            .collect();
        (!options.is_empty()).then(|| format!("OPTION ({})", options.join(", ")))
    }

    fn identity_clause(&self, descriptor: &SequenceDescriptor) -> Result<String> {
        Ok(format!(
            "IDENTITY({}, {})",
            descriptor.start_value.unwrap_or(1),
            descriptor.increment.unwrap_or(1)
        ))
    }

    fn column_default(&self, table_name: &str, column_name: &str, value: &str) -> String {
        format!(
            "CONSTRAINT {} DEFAULT {value}",
            self.default_constraint(table_name, column_name)
        )
    }

    fn collation_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn temporary_table_name(&self, name: &QualifiedName, is_global: bool) -> String {
        let prefix = if is_global { "##" } else { "#" };
        self.quote_identifier(&format!("{prefix}{}", name.name))
    }

    fn temporary_table(&self, _is_global: bool, _preserve_rows: bool) -> Result<(String, String)> {
        Ok(("CREATE TABLE".to_string(), String::new()))
    }

    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    fn rename_table(&self, table: &QualifiedName, new_name: &str) -> Result<String> {
        Ok(format!(
            "EXEC sp_rename {}, {}",
            self.literal(&SqlLiteral::String(self.qualified_name(table)))?,
            self.literal(&SqlLiteral::String(new_name.to_string()))?
        ))
    }

    fn move_table(&self, table: &QualifiedName, new_schema: &str) -> Result<String> {
        Ok(format!(
            "ALTER SCHEMA {} TRANSFER {}",
            self.quote_identifier(new_schema),
            self.qualified_name(table)
        ))
    }

    fn rename_column(&self, table: &QualifiedName, column: &str, new_name: &str) -> Result<String> {
        let path = format!(
            "{}.{}",
            self.qualified_name(table),
            self.quote_identifier(column)
        );
        Ok(format!(
            "EXEC sp_rename {}, {}, N'COLUMN'",
            self.literal(&SqlLiteral::String(path))?,
            self.literal(&SqlLiteral::String(new_name.to_string()))?
        ))
    }

    fn alter_column_type(&self, sql: &AlterColumnSql<'_>) -> Result<String> {
        let nullability = if sql.is_nullable { "NULL" } else { "NOT NULL" };
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} {} {nullability}",
            sql.table, sql.column, sql.data_type
        ))
    }

    fn alter_column_nullability(&self, sql: &AlterColumnSql<'_>) -> Result<String> {
        self.alter_column_type(sql)
    }

    fn alter_column_default(&self, sql: &AlterColumnSql<'_>) -> Result<String> {
        let constraint = self.default_constraint(sql.table_name, sql.column_name);
        Ok(match sql.default_value {
            Some(value) => format!(
                "ALTER TABLE {} ADD CONSTRAINT {constraint} DEFAULT {value} FOR {}",
                sql.table, sql.column
            ),
            None => format!("ALTER TABLE {} DROP CONSTRAINT {constraint}", sql.table),
        })
    }

    fn create_index(&self, sql: &CreateIndexSql<'_>) -> Result<String> {
        ansi::create_index(self, sql, false)
    }

    fn drop_index(&self, table: &QualifiedName, name: &str) -> Result<String> {
        Ok(format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(name),
            self.qualified_name(table)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        ColumnChange, OrderDirection, SqlAlterAction, SqlDdl, SqlExpression, SqlSelect,
        SqlTableRef,
    };
    use crate::compiler::SqlCompiler;
    use crate::model::{Index, IndexColumn, Table, TableColumn};

    fn dbo(name: &str) -> QualifiedName {
        QualifiedName::new("dbo", name)
    }

    fn compile_ddl(ddl: &SqlDdl) -> String {
        let dialect = SqlServerDialect::default();
        SqlCompiler::new(&dialect).compile_ddl(ddl).unwrap().text
    }

    #[test]
    fn test_top_and_parameters() {
        let users = SqlTableRef::new(dbo("users"));
        let query = SqlSelect::from_source(users.clone())
            .column(users.column("name"))
            .filter(users.column("id").eq(SqlExpression::parameter(7)))
            .limit(5);
        let dialect = SqlServerDialect::default();
        let command = SqlCompiler::new(&dialect).compile(&query.into()).unwrap();
        assert_eq!(
            command.text,
            "SELECT TOP (5) [users].[name] FROM [dbo].[users] WHERE [users].[id] = @p1"
        );
    }

    #[test]
    fn test_offset_needs_an_order() {
        let users = SqlTableRef::new(dbo("users"));
        let query = SqlSelect::from_source(users.clone())
            .column(users.column("name"))
            .limit(10)
            .offset(20);
        let dialect = SqlServerDialect::default();
        let compiler = SqlCompiler::new(&dialect);
        assert_eq!(
            compiler.compile(&query.clone().into()).unwrap().text,
            "SELECT [users].[name] FROM [dbo].[users] ORDER BY (SELECT NULL) OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        let ordered = query.order_by(users.column("name"), OrderDirection::Asc);
        assert_eq!(
            compiler.compile(&ordered.into()).unwrap().text,
            "SELECT [users].[name] FROM [dbo].[users] ORDER BY [users].[name] OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_hints_render_as_options() {
        let users = SqlTableRef::new(dbo("users"));
        let query = SqlSelect::from_source(users)
            .hint(SqlHint::FastFirstRows(10))
            .hint(SqlHint::ForceJoinOrder);
        let dialect = SqlServerDialect::default();
        assert_eq!(
            SqlCompiler::new(&dialect).compile(&query.into()).unwrap().text,
            "SELECT * FROM [dbo].[users] OPTION (FAST 10, FORCE ORDER)"
        );
    }

    #[test]
    fn test_literals() {
        let dialect = SqlServerDialect::default();
        let render = |expression: SqlExpression| {
            SqlCompiler::new(&dialect)
                .compile_expression(&expression)
                .unwrap()
                .text
        };
        assert_eq!(render(SqlExpression::literal("O'Hara")), "N'O''Hara'");
        assert_eq!(render(SqlExpression::literal(false)), "0");
        assert_eq!(
            render(SqlExpression::literal(SqlLiteral::Binary(vec![0x0F, 0xA0]))),
            "0x0FA0"
        );
        assert_eq!(
            render(SqlExpression::column("a").concat(SqlExpression::column("b"))),
            "[a] + [b]"
        );
    }

    #[test]
    fn test_date_construct_uses_dateadd() {
        let dialect = SqlServerDialect::default();
        let built = SqlExpression::function(
            SqlFunction::DateTimeConstruct,
            vec![
                SqlExpression::literal(2005),
                SqlExpression::literal(3),
                SqlExpression::literal(10),
            ],
        );
        assert_eq!(
            SqlCompiler::new(&dialect).compile_expression(&built).unwrap().text,
            "DATEADD(day, 10 - 1, DATEADD(month, 3 - 1, DATEADD(year, 2005 - 2001, CAST('2001-01-01T00:00:00' AS datetime2))))"
        );
    }

    #[test]
    fn test_create_table_with_identity_and_default() {
        let mut table = Table::new("orders");
        table
            .add_column(
                TableColumn::new("id", SqlType::Int32)
                    .identity(SequenceDescriptor::new(1, 1))
                    .not_null(),
            )
            .unwrap();
        table
            .add_column(
                TableColumn::new("status", SqlValueType::varchar(20))
                    .default_value(SqlExpression::literal("new")),
            )
            .unwrap();
        let ddl = SqlDdl::CreateTable {
            schema: "dbo".to_string(),
            table,
        };
        assert_eq!(
            compile_ddl(&ddl),
            "CREATE TABLE [dbo].[orders] ([id] int IDENTITY(1, 1) NOT NULL, [status] nvarchar(20) CONSTRAINT [DF_orders_status] DEFAULT N'new')"
        );
    }

    #[test]
    fn test_temporary_tables_use_hash_names() {
        let mut table = Table::temporary("scratch", false, true);
        table
            .add_column(TableColumn::new("id", SqlType::Int32))
            .unwrap();
        let ddl = SqlDdl::CreateTable {
            schema: "dbo".to_string(),
            table,
        };
        assert_eq!(compile_ddl(&ddl), "CREATE TABLE [#scratch] ([id] int)");
    }

    #[test]
    fn test_column_changes() {
        assert_eq!(
            compile_ddl(&SqlDdl::alter(
                dbo("users"),
                SqlAlterAction::RenameColumn {
                    column: "name".to_string(),
                    new_name: "full_name".to_string(),
                },
            )),
            "EXEC sp_rename N'[dbo].[users].[name]', N'full_name', N'COLUMN'"
        );
        assert_eq!(
            compile_ddl(&SqlDdl::MoveTable {
                table: dbo("users"),
                new_schema: "archive".to_string(),
            }),
            "ALTER SCHEMA [archive] TRANSFER [dbo].[users]"
        );
        assert_eq!(
            compile_ddl(&SqlDdl::DropIndex {
                table: dbo("users"),
                name: "ix_users_name".to_string(),
            }),
            "DROP INDEX [ix_users_name] ON [dbo].[users]"
        );
    }

    #[test]
    fn test_filtered_index_with_fill_factor() {
        let mut index = Index::new("ix_users_email")
            .unique()
            .with_column(IndexColumn::column("email"))
            .filtered(SqlExpression::column("email").is_not_null());
        index.fill_factor = Some(80);
        let ddl = SqlDdl::CreateIndex {
            table: dbo("users"),
            index,
        };
        assert_eq!(
            compile_ddl(&ddl),
            "CREATE UNIQUE INDEX [ix_users_email] ON [dbo].[users] ([email]) WHERE [email] IS NOT NULL WITH (FILLFACTOR = 80)"
        );
    }

    #[test]
    fn test_sequences_need_2012() {
        let old = SqlServerDialect::new(ServerVersion::new(10, 50, 0));
        assert!(!old.supports(Feature::Sequences));
        let current = SqlServerDialect::default();
        assert_eq!(
            current.next_value(&dbo("order_numbers")).as_deref(),
            Ok("NEXT VALUE FOR [dbo].[order_numbers]")
        );
    }

    #[test]
    fn test_alter_default_uses_named_constraint() {
        let ddl = SqlDdl::alter(
            dbo("users"),
            SqlAlterAction::AlterColumn {
                column: TableColumn::new("status", SqlValueType::varchar(20)),
                change: ColumnChange::DropDefault,
            },
        );
        assert_eq!(
            compile_ddl(&ddl),
            "ALTER TABLE [dbo].[users] DROP CONSTRAINT [DF_users_status]"
        );
    }
}
