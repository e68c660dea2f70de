//! Schema upgrades for live databases.
//!
//! `oxide-migrate` compares a live database with a target catalog and
//! applies the difference:
//! - the live schema is read with the catalog extractor
//! - the planner orders the actions and blocks data-losing ones unless they
//!   are acknowledged with a remove hint
//! - the plan is compiled for the connected engine and run in a single
//!   transaction
//!
//! # Architecture
//!
//! - **Config** - JSON upgrade settings (mode, ignore rules, hints) and
//!   target catalog files
//! - **Executor** - Plans against a SQLite pool and applies the result
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_migrate::prelude::*;
//!
//! let target = load_catalog("schema.json")?;
//! let executor = UpgradeExecutor::connect(pool)
//!     .await?
//!     .config(UpgradeConfig::load("upgrade.json")?);
//! let plan = executor.plan(&target).await?;
//! executor.apply(&plan).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Dump the live schema as JSON
//! oxide-migrate extract --output schema.json
//!
//! # Print the SQL that would bring the database to a target schema
//! oxide-migrate plan --target schema.json --config upgrade.json
//!
//! # Apply it
//! oxide-migrate upgrade --target schema.json
//! ```

pub mod config;
pub mod error;
pub mod executor;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{load_catalog, UpgradeConfig};
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::UpgradeExecutor;
}
