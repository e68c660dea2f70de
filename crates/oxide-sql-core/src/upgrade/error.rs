//! Upgrade planning errors.

use super::validate::ValidationReport;
use crate::compiler::CompileError;

/// Errors raised while comparing catalogs or planning an upgrade.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// A planned action has no rendering in the target dialect.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Safe mode found changes that may lose data.
    #[error("Upgrade blocked in safe mode:\n{0}")]
    UnsafeUpgrade(ValidationReport),

    /// A hint names a node that does not exist, or mixes node levels.
    #[error("Invalid upgrade hint: {0}")]
    InvalidHint(String),

    /// An ignore rule is not a valid pattern.
    #[error("Invalid ignore pattern: {0}")]
    InvalidIgnorePattern(#[from] regex::Error),
}

/// Result type for upgrade planning.
pub type Result<T> = std::result::Result<T, UpgradeError>;
