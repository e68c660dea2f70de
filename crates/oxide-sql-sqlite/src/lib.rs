//! # oxide-sql-sqlite
//!
//! Live SQLite support for `oxide-sql-core`, built on `sqlx`.
//!
//! - [`SqliteCatalogSource`] answers catalog queries from a pool, so the
//!   core extractor can read a database into a catalog.
//! - [`SqliteRunner`] detects the library version, compiles statements with
//!   the matching dialect and executes them.
//!
//! SQLite has a single `main` schema, so extracted catalogs always contain
//! exactly that schema. `ALTER TABLE` cannot add or drop constraints; plans
//! for SQLite keep foreign keys inside `CREATE TABLE`.

mod error;
mod runner;
mod source;

pub use error::{Result, SqliteError};
pub use runner::SqliteRunner;
pub use source::SqliteCatalogSource;
