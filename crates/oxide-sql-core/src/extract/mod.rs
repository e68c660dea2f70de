//! Catalog extraction: reads live database metadata into a [`Catalog`].
//!
//! Every [`ExtractionTarget`] is one read-only catalog query. Each
//! dialect's [`CatalogDialect`] supplies the query text; the queries all
//! project the canonical column layout documented on the target, sorted by
//! owner and then child ordinal. Rows are consumed in a single forward pass
//! that starts a new owner group whenever the owner changes, and fails with
//! [`ExtractError::UnsortedRows`] when a completed owner shows up again.
//!
//! Sources are driver-agnostic: [`CatalogSource`] and
//! [`AsyncCatalogSource`] are implemented by the driver crates.
//!
//! ```rust
//! use oxide_sql_core::catalog_row;
//! use oxide_sql_core::extract::{CatalogExtractor, CatalogRow, CatalogSource, SqliteCatalog};
//!
//! struct Fixture;
//!
//! impl CatalogSource for Fixture {
//!     fn fetch(
//!         &mut self,
//!         sql: &str,
//!     ) -> Result<Vec<CatalogRow>, Box<dyn std::error::Error + Send + Sync>> {
//!         Ok(if sql.contains("m.type = 'table'") && !sql.contains("pragma") {
//!             vec![catalog_row!["main", "orders", "table"]]
//!         } else {
//!             Vec::new()
//!         })
//!     }
//! }
//!
//! let catalog = CatalogExtractor::new(&SqliteCatalog)
//!     .extract("shop", &mut Fixture)
//!     .unwrap();
//! assert_eq!(catalog.all_tables().count(), 1);
//! ```
//!
//! [`Catalog`]: crate::model::Catalog

mod decode;
mod error;
mod extractor;
mod firebird;
mod postgres;
mod row;
mod sqlite;
mod state;

use std::borrow::Cow;
use std::fmt;

pub use decode::{BooleanEncoding, KeyKind, referential_action};
pub use error::{ExtractError, Result, SourceError};
pub use extractor::{CancellationFlag, CatalogExtractor};
pub use firebird::FirebirdCatalog;
pub use postgres::PostgresCatalog;
pub use row::{AsyncCatalogSource, CatalogRow, CatalogSource, CatalogValue};
pub use sqlite::SqliteCatalog;

use crate::ast::SqlExpression;
use crate::dialect::{DialectKind, ServerVersion};
use crate::model::{SqlValueType, TableKind};

/// One catalog query, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtractionTarget {
    /// `schema, table, kind`
    Tables,
    /// `schema, table, ordinal, name, type_code, subcode, type_name,
    /// precision, scale, length, nullable, default, collation, identity`
    Columns,
    /// `schema, view, definition`
    Views,
    /// `schema, view, ordinal, name`
    ViewColumns,
    /// `schema, table, index, ordinal, column, expression, descending,
    /// unique, filter, clustered, fill_factor`
    Indexes,
    /// `schema, table, constraint, ordinal, column, ref_schema, ref_table,
    /// ref_column, delete_rule, update_rule, deferrable, initially_deferred`
    ForeignKeys,
    /// `schema, table, constraint, condition`
    CheckConstraints,
    /// `schema, table, constraint, type, ordinal, column`
    KeyConstraints,
    /// `schema, sequence, start, increment, min, max, cycle, current`
    Sequences,
}

impl ExtractionTarget {
    /// All targets in the order they are queried.
    pub const ALL: [Self; 9] = [
        Self::Tables,
        Self::Columns,
        Self::Views,
        Self::ViewColumns,
        Self::Indexes,
        Self::ForeignKeys,
        Self::CheckConstraints,
        Self::KeyConstraints,
        Self::Sequences,
    ];

    /// Short name used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tables => "tables",
            Self::Columns => "columns",
            Self::Views => "views",
            Self::ViewColumns => "view columns",
            Self::Indexes => "indexes",
            Self::ForeignKeys => "foreign keys",
            Self::CheckConstraints => "check constraints",
            Self::KeyConstraints => "key constraints",
            Self::Sequences => "sequences",
        }
    }
}

impl fmt::Display for ExtractionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw type facets of a column row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnType {
    /// Numeric vendor type code.
    pub code: Option<i64>,
    /// Numeric vendor subtype.
    pub subcode: Option<i64>,
    /// Vendor type name.
    pub name: Option<String>,
    /// Numeric precision.
    pub precision: Option<u8>,
    /// Numeric scale.
    pub scale: Option<u8>,
    /// Character or binary length.
    pub length: Option<u32>,
}

/// Per-dialect catalog configuration: queries plus value decoders.
pub trait CatalogDialect: Send + Sync + fmt::Debug {
    /// The dialect this catalog belongs to.
    fn kind(&self) -> DialectKind;

    /// Schema used for rows whose schema column is NULL.
    fn default_schema(&self) -> &str;

    /// Query text for a target; `None` when the vendor has no such objects.
    fn query(&self, target: ExtractionTarget) -> Option<Cow<'static, str>>;

    /// Encoding of the flag columns.
    fn boolean_encoding(&self) -> BooleanEncoding;

    /// Maps raw type facets to a canonical type.
    fn value_type(&self, column: &ColumnType) -> Result<SqlValueType>;

    /// Decodes the `kind` column of the tables query.
    fn table_kind(&self, value: &CatalogValue) -> Result<TableKind>;

    /// Wraps raw default text.
    fn default_value(&self, text: &str) -> Option<SqlExpression> {
        decode::native_default(text)
    }

    /// Wraps raw check constraint text.
    fn check_condition(&self, text: &str) -> SqlExpression {
        decode::native_check(text)
    }

    /// Wraps raw partial index predicate text.
    fn index_filter(&self, text: &str) -> SqlExpression {
        SqlExpression::native(decode::strip_keyword(text, "WHERE"))
    }

    /// Wraps raw index expression text.
    fn index_expression(&self, text: &str) -> SqlExpression {
        SqlExpression::native(text.trim())
    }
}

/// Catalog configuration for a dialect, if extraction supports it.
#[must_use]
pub fn catalog_for(kind: DialectKind, version: Option<ServerVersion>) -> Option<Box<dyn CatalogDialect>> {
    let version = version.unwrap_or_else(|| kind.default_version());
    match kind {
        DialectKind::PostgreSql => Some(Box::new(PostgresCatalog)),
        DialectKind::Sqlite => Some(Box::new(SqliteCatalog)),
        DialectKind::Firebird => Some(Box::new(FirebirdCatalog::new(version))),
        DialectKind::Generic | DialectKind::SqlServer => None,
    }
}
