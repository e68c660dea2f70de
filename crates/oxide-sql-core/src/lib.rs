//! # oxide-sql-core
//!
//! A vendor-neutral SQL schema model with everything needed to move it in
//! and out of real databases:
//!
//! - [`model`]: catalogs, schemas, tables, views, sequences and the smaller
//!   vendor objects, with name uniqueness and reference checks.
//! - [`ast`]: statement and expression trees that are independent of any
//!   SQL dialect.
//! - [`compiler`] and [`dialect`]: render trees as dialect SQL text plus
//!   parameters, rewriting constructs a dialect lacks.
//! - [`extract`]: read a live catalog through dialect metadata queries.
//! - [`upgrade`]: compare two catalogs and plan the DDL that turns one into
//!   the other.
//!
//! ```rust
//! use oxide_sql_core::ast::SqlDdl;
//! use oxide_sql_core::compiler::SqlCompiler;
//! use oxide_sql_core::dialect::{DialectKind, SqliteDialect};
//! use oxide_sql_core::model::{SqlType, Table};
//!
//! let mut table = Table::new("orders");
//! table.create_column("id", SqlType::Int64).unwrap();
//! table.create_primary_key("pk_orders", &["id"]).unwrap();
//!
//! let dialect = SqliteDialect::new(DialectKind::Sqlite.default_version());
//! let ddl = SqlDdl::CreateTable { schema: "main".into(), table };
//! let command = SqlCompiler::new(&dialect).compile_ddl(&ddl).unwrap();
//! assert!(command.text.starts_with(r#"CREATE TABLE "orders""#));
//! ```

pub mod ast;
pub mod compiler;
pub mod dialect;
pub mod extract;
pub mod model;
pub mod upgrade;
