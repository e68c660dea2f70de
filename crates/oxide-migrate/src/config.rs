//! Upgrade configuration and target schema files.
//!
//! Both are JSON. A configuration looks like:
//!
//! ```json
//! {
//!   "mode": "perform_safely",
//!   "ignore": [{ "table": "sqlite_*" }],
//!   "hints": [
//!     { "kind": "rename", "from": "main.users.name", "to": "main.users.full_name" },
//!     { "kind": "remove", "path": "main.audit" }
//!   ],
//!   "dialect": "sqlite"
//! }
//! ```
//!
//! Every field is optional.

use std::fs;
use std::path::Path;

use oxide_sql_core::dialect::{Dialect, DialectKind, Feature};
use oxide_sql_core::model::Catalog;
use oxide_sql_core::upgrade::{IgnoreRule, IgnoreRules, UpgradeHint, UpgradeMode, UpgradePlanner};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MigrateError, Result};

/// Settings for one upgrade run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    /// Whether unsafe actions block the plan.
    pub mode: UpgradeMode,
    /// Nodes left out of the comparison.
    pub ignore: Vec<IgnoreRule>,
    /// Renames and acknowledged removals.
    pub hints: Vec<UpgradeHint>,
    /// Dialect used to print SQL. Defaults to the connected engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<DialectKind>,
}

impl UpgradeConfig {
    /// Reads and checks a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.check(path)?;
        debug!(
            path = %path.display(),
            ignore = config.ignore.len(),
            hints = config.hints.len(),
            "Loaded upgrade configuration"
        );
        Ok(config)
    }

    /// Rejects ignore rules that are empty or do not compile, reporting
    /// all of them.
    fn check(&self, path: &Path) -> Result<()> {
        let invalid = |message: String| MigrateError::InvalidConfig {
            path: path.to_path_buf(),
            message,
        };
        let mut errors = Vec::new();
        for (index, rule) in self.ignore.iter().enumerate() {
            let parts = [&rule.database, &rule.schema, &rule.table, &rule.column];
            if parts.iter().all(|part| part.is_none()) {
                errors.push(invalid(format!("ignore rule {index} has no pattern")));
            } else if parts.iter().any(|part| part.as_deref() == Some("")) {
                errors.push(invalid(format!("ignore rule {index} has an empty pattern")));
            } else if let Err(e) = IgnoreRules::new(std::slice::from_ref(rule)) {
                errors.push(invalid(format!("ignore rule {index}: {e}")));
            }
        }
        MigrateError::collect(errors)
    }

    /// A planner carrying this configuration for `dialect`.
    ///
    /// Dialects that cannot add constraints to an existing table get their
    /// foreign keys inside `CREATE TABLE`.
    #[must_use]
    pub fn planner(&self, dialect: &dyn Dialect) -> UpgradePlanner {
        UpgradePlanner::new()
            .mode(self.mode)
            .ignore_all(self.ignore.iter().cloned())
            .hints(self.hints.iter().cloned())
            .inline_foreign_keys(!dialect.supports(Feature::AlterConstraints))
    }
}

/// Reads a target catalog from JSON and validates it.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog> {
    let catalog: Catalog = serde_json::from_str(&fs::read_to_string(path)?)?;
    catalog.validate()?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = write_config("{}");
        let config = UpgradeConfig::load(file.path()).unwrap();
        assert_eq!(config, UpgradeConfig::default());
        assert_eq!(config.mode, UpgradeMode::PerformSafely);
    }

    #[test]
    fn test_full_config() {
        let file = write_config(
            r#"{
                "mode": "perform",
                "ignore": [{ "schema": "main", "table": "legacy_*" }],
                "hints": [{ "kind": "remove", "path": "main.audit" }],
                "dialect": "postgresql"
            }"#,
        );
        let config = UpgradeConfig::load(file.path()).unwrap();
        assert_eq!(config.mode, UpgradeMode::Perform);
        assert_eq!(config.ignore[0].table.as_deref(), Some("legacy_*"));
        assert_eq!(config.hints, vec![UpgradeHint::remove("main.audit").unwrap()]);
        assert_eq!(config.dialect, Some(DialectKind::PostgreSql));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let file = write_config(r#"{ "mode": "yolo" }"#);
        let err = UpgradeConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, MigrateError::Serialization(_)));
    }

    #[test]
    fn test_bad_ignore_rules_are_reported_together() {
        let file = write_config(r#"{ "ignore": [{}, { "table": "" }, { "table": "ok" }] }"#);
        let err = UpgradeConfig::load(file.path()).unwrap_err();
        let MigrateError::Multiple(errors) = &err else {
            panic!("expected several errors, got {err}");
        };
        assert_eq!(errors.len(), 2);
        assert!(err.to_string().contains("ignore rule 0 has no pattern"));
        assert!(err.to_string().contains("ignore rule 1 has an empty pattern"));
    }

    #[test]
    fn test_single_bad_rule_is_not_wrapped() {
        let file = write_config(r#"{ "ignore": [{ "schema": "" }] }"#);
        let err = UpgradeConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidConfig { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = UpgradeConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, MigrateError::Io(_)));
    }
}
