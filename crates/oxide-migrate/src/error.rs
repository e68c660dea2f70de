//! Error types for the upgrade tool.

use std::path::PathBuf;

use oxide_sql_core::compiler::CompileError;
use oxide_sql_core::extract::ExtractError;
use oxide_sql_core::model::ModelError;
use oxide_sql_core::upgrade::UpgradeError;
use oxide_sql_sqlite::SqliteError;

/// Errors raised while loading configuration, planning or applying upgrades.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error while applying statements.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Error from the SQLite runner.
    #[error(transparent)]
    Sqlite(#[from] SqliteError),

    /// A target catalog is inconsistent.
    #[error("Invalid target schema: {0}")]
    Model(#[from] ModelError),

    /// A statement cannot be rendered for the dialect.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Reading the live catalog failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Planning failed or was refused.
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),

    /// IO error (reading configuration or schema files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration entry is rejected.
    #[error("Invalid configuration '{path}': {message}")]
    InvalidConfig {
        /// Path to the configuration file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Multiple errors occurred.
    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<MigrateError>),
}

/// Result type for upgrade operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

impl MigrateError {
    /// Folds collected errors: nothing, the single error, or `Multiple`.
    pub(crate) fn collect(mut errors: Vec<Self>) -> std::result::Result<(), Self> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Multiple(errors)),
        }
    }
}
