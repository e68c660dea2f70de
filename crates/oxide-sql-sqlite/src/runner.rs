//! Executes compiled commands on a SQLite pool.

use oxide_sql_core::ast::{SqlDdl, SqlExpression, SqlLiteral};
use oxide_sql_core::compiler::{CompiledCommand, SqlCompiler};
use oxide_sql_core::dialect::{ServerVersion, SqliteDialect};
use oxide_sql_core::extract::{CatalogExtractor, SqliteCatalog};
use oxide_sql_core::model::Catalog;
use sqlx::sqlite::{SqliteArguments, SqlitePool};
use sqlx::{Row, Sqlite};
use tracing::{debug, info};

use crate::error::Result;
use crate::source::SqliteCatalogSource;

type Query<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A pool together with the dialect matching its library version.
#[derive(Debug, Clone)]
pub struct SqliteRunner {
    pool: SqlitePool,
    dialect: SqliteDialect,
}

impl SqliteRunner {
    /// Wraps a pool, reading the library version with `sqlite_version()`.
    pub async fn connect(pool: SqlitePool) -> Result<Self> {
        let version: String = sqlx::query("SELECT sqlite_version()")
            .fetch_one(&pool)
            .await?
            .try_get(0)?;
        let version: ServerVersion = version.parse()?;
        info!(version = %version, "Connected to SQLite");
        Ok(Self {
            pool,
            dialect: SqliteDialect::new(version),
        })
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The dialect for the connected library version.
    #[must_use]
    pub const fn dialect(&self) -> &SqliteDialect {
        &self.dialect
    }

    /// Runs a compiled command and returns the affected row count.
    pub async fn execute(&self, command: &CompiledCommand) -> Result<u64> {
        debug!(sql = %command.text, "Executing SQL");
        let result = bind(sqlx::query(&command.text), command)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Runs commands in order inside one transaction. Nothing is kept when
    /// any of them fails.
    pub async fn execute_all(&self, commands: &[CompiledCommand]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for command in commands {
            debug!(sql = %command.text, "Executing SQL");
            affected += bind(sqlx::query(&command.text), command)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        info!(statements = commands.len(), "Committed batch");
        Ok(affected)
    }

    /// Compiles and runs a DDL statement.
    pub async fn execute_ddl(&self, ddl: &SqlDdl) -> Result<()> {
        let command = SqlCompiler::new(&self.dialect).compile_ddl(ddl)?;
        self.execute(&command).await?;
        Ok(())
    }

    /// Evaluates an expression with `SELECT` and returns its text form.
    pub async fn evaluate(&self, expression: &SqlExpression) -> Result<Option<String>> {
        let command = SqlCompiler::new(&self.dialect).compile_expression(expression)?;
        let sql = format!("SELECT CAST(({}) AS TEXT)", command.text);
        debug!(sql = %sql, "Evaluating expression");
        let row = bind(sqlx::query(&sql), &command)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }

    /// Reads the `main` schema into a catalog named `name`.
    pub async fn extract(&self, name: &str) -> Result<Catalog> {
        let mut source = SqliteCatalogSource::new(self.pool.clone());
        let catalog = CatalogExtractor::new(&SqliteCatalog)
            .extract_async(name, &mut source)
            .await?;
        Ok(catalog)
    }
}

fn bind<'q>(mut query: Query<'q>, command: &CompiledCommand) -> Query<'q> {
    for parameter in &command.parameters {
        query = match parameter.value.clone().unwrap_or(SqlLiteral::Null) {
            SqlLiteral::Null => query.bind(Option::<i64>::None),
            SqlLiteral::Boolean(value) => query.bind(value),
            SqlLiteral::Integer(value) | SqlLiteral::Interval(value) => query.bind(value),
            SqlLiteral::Double(value) => query.bind(value),
            SqlLiteral::Decimal(value) | SqlLiteral::String(value) | SqlLiteral::Guid(value) => {
                query.bind(value)
            }
            SqlLiteral::Binary(value) => query.bind(value),
            SqlLiteral::Date(value) => query.bind(value),
            SqlLiteral::Time(value) => query.bind(value),
            SqlLiteral::DateTime(value) => query.bind(value),
            SqlLiteral::DateTimeOffset(value) => query.bind(value),
        };
    }
    query
}
