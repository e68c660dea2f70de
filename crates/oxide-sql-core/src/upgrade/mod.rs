//! Schema comparison and upgrade planning.
//!
//! [`compare`] matches the nodes of two catalogs (hints first, then names)
//! and returns a [`CatalogDiff`]. [`UpgradePlanner`] strips ignored nodes
//! from both sides, compares them and turns the difference into
//! [`UpgradeAction`]s ordered by [`UpgradeStage`]: dependents are dropped
//! before what they depend on, and dependencies are created before their
//! dependents.
//!
//! Changes that may lose data are collected into a [`ValidationReport`].
//! In [`UpgradeMode::PerformSafely`] a non-empty report blocks the plan; in
//! [`UpgradeMode::Perform`] each finding is logged and the plan proceeds.
//!
//! ```rust
//! use oxide_sql_core::model::{Catalog, SqlType};
//! use oxide_sql_core::upgrade::{UpgradeError, UpgradeHint, UpgradePlanner};
//!
//! let mut old = Catalog::new("shop");
//! let main = old.create_schema("main").unwrap();
//! main.create_table("audit").unwrap().create_column("id", SqlType::Int32).unwrap();
//! let mut new = Catalog::new("shop");
//! new.create_schema("main").unwrap();
//!
//! let blocked = UpgradePlanner::new().plan(&old, &new);
//! assert!(matches!(blocked, Err(UpgradeError::UnsafeUpgrade(_))));
//!
//! let plan = UpgradePlanner::new()
//!     .hint(UpgradeHint::remove("main.audit").unwrap())
//!     .plan(&old, &new)
//!     .unwrap();
//! assert_eq!(plan.len(), 1);
//! ```

mod compare;
mod error;
mod hint;
mod ignore;
mod path;
mod planner;
mod validate;

pub use compare::{compare, CatalogDiff, NodeDiff, PropertyChange, Scoped, TableDiff};
pub use error::{Result, UpgradeError};
pub use hint::UpgradeHint;
pub use ignore::{IgnoreRule, IgnoreRules};
pub use path::NodePath;
pub use planner::{UpgradeAction, UpgradeMode, UpgradePlan, UpgradePlanner, UpgradeStage};
pub use validate::{UnsafeReason, ValidationIssue, ValidationReport};
