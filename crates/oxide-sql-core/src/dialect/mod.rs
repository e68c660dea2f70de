//! SQL dialects.
//!
//! A [`Dialect`] renders the tokens and fragments that differ between
//! database engines. Every hook has an ANSI default; a dialect overrides
//! only the hooks whose default is wrong for its engine and falls back to
//! the shared defaults in [`ansi`] for the rest.
//!
//! What a dialect can do depends on the server version it was created for.
//! Each dialect derives a [`FeatureSet`] from a base table plus
//! version-gated deltas when it is constructed.

pub mod ansi;
mod firebird;
mod generic;
mod postgres;
mod sqlite;
mod sqlserver;

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use firebird::FirebirdDialect;
pub use generic::GenericDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::ast::{BinaryOperator, DateTimePart, SqlExpression, SqlFunction, SqlHint, SqlLiteral};
use crate::compiler::{CompileError, Result};
use crate::model::{Collation, QualifiedName, SequenceDescriptor, SqlValueType, TableColumn};

/// A database server version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ServerVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch level.
    pub patch: u32,
}

impl ServerVersion {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ServerVersion {
    type Err = CompileError;

    /// Parses `major[.minor[.patch]]`, ignoring any suffix after the
    /// numeric part of each component (`16.2 (Debian)` reads as 16.2.0).
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CompileError::InvalidVersion(s.to_string());
        let numeric = s.split_whitespace().next().unwrap_or_default();
        let mut parts = numeric.split('.').map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u32>()
        });
        let major = parts.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
        let minor = parts.next().transpose().map_err(|_| invalid())?.unwrap_or(0);
        let patch = parts.next().transpose().map_err(|_| invalid())?.unwrap_or(0);
        Ok(Self::new(major, minor, patch))
    }
}

/// Capabilities that vary between engines and versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Objects live in named schemas.
    Schemas,
    /// A native boolean type with TRUE/FALSE literals.
    BooleanType,
    /// Inline array values.
    ArrayLiteral,
    /// `GENERATED ... AS IDENTITY` or an equivalent.
    IdentityColumns,
    /// Auto-increment only on an inline integer primary key.
    AutoIncrementKey,
    /// Sequence objects.
    Sequences,
    /// Column rename.
    RenameColumn,
    /// Column drop.
    DropColumn,
    /// Column type and nullability changes.
    AlterColumn,
    /// Adding and dropping constraints on existing tables.
    AlterConstraints,
    /// Deferrable constraints.
    DeferrableConstraints,
    /// `CASCADE` on drops.
    CascadeDrop,
    /// `VALUES` with several rows.
    MultiRowValues,
    /// Partial indexes.
    FilteredIndexes,
    /// Indexes over expressions.
    ExpressionIndexes,
    /// Clustered indexes.
    ClusteredIndexes,
    /// Index fill factor.
    IndexFillFactor,
    /// Collation objects.
    Collations,
    /// Character set objects.
    CharacterSets,
    /// Partition functions.
    PartitionFunctions,
    /// Temporary tables.
    TemporaryTables,
    /// Trigonometric and logarithmic functions.
    MathFunctions,
    /// Datetime with zone offset.
    DateTimeOffset,
    /// A native interval type; without it intervals are nanosecond counts.
    IntervalType,
    /// Optimizer hints.
    OptimizerHints,
    /// Moving a table between schemas.
    MoveTable,
}

/// The capabilities of one dialect instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    /// Builds a set from a base table plus the deltas whose minimum
    /// version is at most `version`.
    #[must_use]
    pub fn for_version(
        version: ServerVersion,
        base: &[Feature],
        deltas: &[(ServerVersion, &[Feature])],
    ) -> Self {
        let mut features: BTreeSet<Feature> = base.iter().copied().collect();
        for (since, added) in deltas {
            if version >= *since {
                features.extend(added.iter().copied());
            }
        }
        Self(features)
    }

    /// Returns `true` if the feature is present.
    #[must_use]
    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    /// Iterates the features in order.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

/// Supported engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// ANSI SQL.
    #[default]
    Generic,
    /// PostgreSQL.
    PostgreSql,
    /// SQLite.
    Sqlite,
    /// Firebird.
    Firebird,
    /// Microsoft SQL Server.
    SqlServer,
}

impl DialectKind {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::PostgreSql => "postgresql",
            Self::Sqlite => "sqlite",
            Self::Firebird => "firebird",
            Self::SqlServer => "sqlserver",
        }
    }

    /// Version assumed when none is given.
    #[must_use]
    pub const fn default_version(self) -> ServerVersion {
        match self {
            Self::Generic => ServerVersion::new(0, 0, 0),
            Self::PostgreSql | Self::SqlServer => ServerVersion::new(16, 0, 0),
            Self::Sqlite => ServerVersion::new(3, 45, 0),
            Self::Firebird => ServerVersion::new(4, 0, 0),
        }
    }

    /// Creates the dialect for a server version.
    #[must_use]
    pub fn create(self, version: Option<ServerVersion>) -> Box<dyn Dialect> {
        let version = version.unwrap_or_else(|| self.default_version());
        match self {
            Self::Generic => Box::new(GenericDialect::new()),
            Self::PostgreSql => Box::new(PostgresDialect::new(version)),
            Self::Sqlite => Box::new(SqliteDialect::new(version)),
            Self::Firebird => Box::new(FirebirdDialect::new(version)),
            Self::SqlServer => Box::new(SqlServerDialect::new(version)),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(Self::Generic),
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSql),
            "sqlite" => Ok(Self::Sqlite),
            "firebird" => Ok(Self::Firebird),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            _ => Err(CompileError::UnknownDialect(s.to_string())),
        }
    }
}

/// Where a dialect puts row limiting in a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitClause {
    /// Nothing to render.
    Omitted,
    /// Right after `SELECT`, before `DISTINCT`.
    Head(String),
    /// After `SELECT DISTINCT`.
    HeadAfterDistinct(String),
    /// After ORDER BY.
    Tail(String),
}

/// Rendered pieces of an `ALTER COLUMN`.
#[derive(Debug, Clone, Copy)]
pub struct AlterColumnSql<'a> {
    /// Qualified table name.
    pub table: &'a str,
    /// Unquoted table name.
    pub table_name: &'a str,
    /// Quoted column name.
    pub column: &'a str,
    /// Unquoted column name.
    pub column_name: &'a str,
    /// Rendered column type.
    pub data_type: &'a str,
    /// Column nullability after the change.
    pub is_nullable: bool,
    /// Rendered default, if any.
    pub default_value: Option<&'a str>,
}

/// One rendered key of a `CREATE INDEX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeySql {
    /// Quoted column name or rendered expression.
    pub text: String,
    /// The key is an expression rather than a column.
    pub is_expression: bool,
    /// Descending order.
    pub descending: bool,
}

/// Rendered pieces of a `CREATE INDEX`.
#[derive(Debug, Clone, Copy)]
pub struct CreateIndexSql<'a> {
    /// Quoted index name, never schema-qualified.
    pub name: &'a str,
    /// Qualified table name.
    pub table: &'a str,
    /// `UNIQUE`.
    pub unique: bool,
    /// Clustered index.
    pub clustered: bool,
    /// Keys in order.
    pub keys: &'a [IndexKeySql],
    /// Rendered partial index predicate.
    pub filter: Option<&'a str>,
    /// Leaf page fill percentage.
    pub fill_factor: Option<u8>,
}

/// Per-engine rendering hooks.
///
/// Arguments named `operand`, `args`, `left` and `right` are fragments that
/// are already rendered.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Engine family.
    fn kind(&self) -> DialectKind;

    /// Dialect name for messages.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Server version this instance targets.
    fn version(&self) -> ServerVersion;

    /// Capabilities for the version.
    fn features(&self) -> &FeatureSet;

    /// Returns `true` if the feature is present.
    fn supports(&self, feature: Feature) -> bool {
        self.features().contains(feature)
    }

    /// Fails with [`CompileError::Unsupported`] unless the feature is present.
    fn require(&self, feature: Feature, construct: &str) -> Result<()> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(CompileError::unsupported(self.name(), construct))
        }
    }

    // ---- tokens ----

    /// Quotes an identifier.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Renders a schema-qualified object name.
    fn qualified_name(&self, name: &QualifiedName) -> String {
        if self.supports(Feature::Schemas) && !name.schema.is_empty() {
            format!(
                "{}.{}",
                self.quote_identifier(&name.schema),
                self.quote_identifier(&name.name)
            )
        } else {
            self.quote_identifier(&name.name)
        }
    }

    /// Placeholder for the parameter at 1-based `position`.
    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    /// Renders a constant.
    fn literal(&self, value: &SqlLiteral) -> Result<String> {
        ansi::literal(self, value)
    }

    /// Renders a column type.
    fn type_name(&self, data_type: &SqlValueType) -> Result<String>;

    // ---- expressions ----

    /// Rewrites a node into primitives the engine supports.
    ///
    /// Returning `Some` makes the compiler render the replacement instead.
    fn lower(&self, expression: &SqlExpression) -> Result<Option<SqlExpression>> {
        crate::compiler::lower::standard(self, expression)
    }

    /// Renders an infix operation.
    fn binary(&self, op: BinaryOperator, left: &str, right: &str) -> Result<String> {
        ansi::binary(self, op, left, right)
    }

    /// Renders `operand IN (items)` against an inline array.
    fn in_array(&self, _operand: &str, _items: &[String], _negated: bool) -> Result<String> {
        Err(CompileError::unsupported(self.name(), "array literals"))
    }

    /// Renders a canonical function call.
    fn function(&self, function: SqlFunction, args: &[String]) -> Result<String> {
        ansi::function(self, function, args)
    }

    /// Renders `NEXT VALUE` for a sequence.
    fn next_value(&self, sequence: &QualifiedName) -> Result<String> {
        self.require(Feature::Sequences, "sequences")?;
        Ok(format!("NEXT VALUE FOR {}", self.qualified_name(sequence)))
    }

    /// Renders a type conversion.
    fn cast(&self, operand: &str, target: &SqlValueType) -> Result<String> {
        Ok(format!("CAST({operand} AS {})", self.type_name(target)?))
    }

    /// Renders a date part extraction.
    fn extract(&self, part: DateTimePart, operand: &str) -> Result<String> {
        Ok(format!("EXTRACT({} FROM {operand})", part.as_str()))
    }

    // ---- queries ----

    /// Row limiting for a SELECT.
    fn limit_clause(
        &self,
        limit: Option<&str>,
        offset: Option<&str>,
        _ordered: bool,
    ) -> Result<LimitClause> {
        Ok(ansi::fetch_first(limit, offset))
    }

    /// Renders optimizer hints, or `None` when there is nothing to render.
    fn query_hints(&self, hints: &[SqlHint]) -> Option<String> {
        ansi::skip_hints(self, hints);
        None
    }

    // ---- DDL ----

    /// Identity clause following the column type.
    fn identity_clause(&self, descriptor: &SequenceDescriptor) -> Result<String> {
        self.require(Feature::IdentityColumns, "identity columns")?;
        Ok(ansi::generated_identity(descriptor))
    }

    /// `DEFAULT value` clause of a column definition.
    fn column_default(&self, _table_name: &str, _column_name: &str, value: &str) -> String {
        format!("DEFAULT {value}")
    }

    /// Collation reference in a column definition.
    fn collation_name(&self, name: &str) -> String {
        self.quote_identifier(name)
    }

    /// Name of a temporary table in `CREATE TABLE`.
    fn temporary_table_name(&self, name: &QualifiedName, _is_global: bool) -> String {
        self.qualified_name(name)
    }

    /// Statement start and end for a temporary table.
    fn temporary_table(&self, _is_global: bool, preserve_rows: bool) -> Result<(String, String)> {
        self.require(Feature::TemporaryTables, "temporary tables")?;
        Ok((
            "CREATE GLOBAL TEMPORARY TABLE".to_string(),
            ansi::on_commit(preserve_rows),
        ))
    }

    /// Keyword introducing a new column in ALTER TABLE.
    fn add_column_keyword(&self) -> &'static str {
        "ADD COLUMN"
    }

    /// Keyword introducing a dropped column in ALTER TABLE.
    fn drop_column_keyword(&self) -> &'static str {
        "DROP COLUMN"
    }

    /// Table rename.
    fn rename_table(&self, table: &QualifiedName, new_name: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.qualified_name(table),
            self.quote_identifier(new_name)
        ))
    }

    /// Moves a table to another schema.
    fn move_table(&self, table: &QualifiedName, new_schema: &str) -> Result<String> {
        self.require(Feature::MoveTable, "moving tables between schemas")?;
        Ok(format!(
            "ALTER TABLE {} SET SCHEMA {}",
            self.qualified_name(table),
            self.quote_identifier(new_schema)
        ))
    }

    /// Column rename.
    fn rename_column(&self, table: &QualifiedName, column: &str, new_name: &str) -> Result<String> {
        self.require(Feature::RenameColumn, "column rename")?;
        Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.qualified_name(table),
            self.quote_identifier(column),
            self.quote_identifier(new_name)
        ))
    }

    /// Column type change.
    fn alter_column_type(&self, sql: &AlterColumnSql<'_>) -> Result<String> {
        self.require(Feature::AlterColumn, "column type change")?;
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {}",
            sql.table, sql.column, sql.data_type
        ))
    }

    /// Column nullability change.
    fn alter_column_nullability(&self, sql: &AlterColumnSql<'_>) -> Result<String> {
        self.require(Feature::AlterColumn, "column nullability change")?;
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

    /// Column default change; `default_value` of `None` drops the default.
    fn alter_column_default(&self, sql: &AlterColumnSql<'_>) -> Result<String> {
        self.require(Feature::AlterColumn, "column default change")?;
        Ok(match sql.default_value {
            Some(value) => format!(
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {value}",
                sql.table, sql.column
            ),
            None => format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                sql.table, sql.column
            ),
        })
    }

    /// Index creation.
    fn create_index(&self, sql: &CreateIndexSql<'_>) -> Result<String> {
        ansi::create_index(self, sql, true)
    }

    /// Options of `CREATE SEQUENCE`, or of `ALTER SEQUENCE` with `restart`.
    fn sequence_options(&self, descriptor: &SequenceDescriptor, restart: bool) -> Result<String> {
        Ok(ansi::sequence_options(descriptor, restart))
    }

    /// Collation creation; `name` is already qualified.
    fn create_collation(&self, name: &str, collation: &Collation) -> Result<String> {
        self.require(Feature::Collations, "collations")?;
        let (Some(character_set), Some(source)) = (&collation.character_set, &collation.source)
        else {
            return Err(CompileError::InvalidNode(format!(
                "collation {name} needs a character set and a source"
            )));
        };
        Ok(format!(
            "CREATE COLLATION {name} FOR {} FROM {}",
            self.quote_identifier(character_set),
            self.quote_identifier(source)
        ))
    }

    /// Index drop.
    fn drop_index(&self, table: &QualifiedName, name: &str) -> Result<String> {
        Ok(format!(
            "DROP INDEX {}",
            self.qualified_name(&QualifiedName::new(table.schema.clone(), name))
        ))
    }

    /// Column definition tail for engines that declare auto-increment keys
    /// inline. Called only when [`Feature::AutoIncrementKey`] is present.
    fn auto_increment_key(&self, _column: &TableColumn, _constraint: &str) -> Result<String> {
        Err(CompileError::unsupported(self.name(), "auto-increment keys"))
    }
}
