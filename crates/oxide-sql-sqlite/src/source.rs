//! Catalog rows read from a live database.

use std::future::Future;

use oxide_sql_core::extract::{AsyncCatalogSource, CatalogRow, CatalogValue, SourceError};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, TypeInfo, ValueRef};
use tracing::trace;

use crate::error::{Result, SqliteError};

/// Runs catalog queries on a pool.
///
/// Values keep their SQLite storage class: INTEGER, REAL and TEXT map to
/// the matching [`CatalogValue`], NULL to [`CatalogValue::Null`].
#[derive(Debug, Clone)]
pub struct SqliteCatalogSource {
    pool: SqlitePool,
}

impl SqliteCatalogSource {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AsyncCatalogSource for SqliteCatalogSource {
    fn fetch(
        &mut self,
        sql: &str,
    ) -> impl Future<Output = std::result::Result<Vec<CatalogRow>, SourceError>> + Send {
        let pool = self.pool.clone();
        let sql = sql.to_string();
        async move {
            let rows = sqlx::query(&sql).fetch_all(&pool).await?;
            trace!(rows = rows.len(), "Fetched catalog rows");
            let rows = rows.iter().map(catalog_row).collect::<Result<Vec<_>>>()?;
            Ok::<_, SourceError>(rows)
        }
    }
}

fn catalog_row(row: &SqliteRow) -> Result<CatalogRow> {
    (0..row.len()).map(|column| catalog_value(row, column)).collect()
}

fn catalog_value(row: &SqliteRow, column: usize) -> Result<CatalogValue> {
    let raw = row.try_get_raw(column)?;
    if raw.is_null() {
        return Ok(CatalogValue::Null);
    }
    let type_name = raw.type_info().name().to_string();
    Ok(match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => CatalogValue::Integer(row.try_get_unchecked::<i64, _>(column)?),
        "REAL" => CatalogValue::Real(row.try_get_unchecked::<f64, _>(column)?),
        "TEXT" => CatalogValue::Text(row.try_get_unchecked::<String, _>(column)?),
        _ => return Err(SqliteError::UnsupportedValue { column, type_name }),
    })
}
