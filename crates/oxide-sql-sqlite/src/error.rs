//! SQLite integration errors.

use oxide_sql_core::compiler::CompileError;
use oxide_sql_core::extract::ExtractError;

/// Errors raised while talking to a live SQLite database.
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// Driver or connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement could not be rendered for SQLite.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Catalog extraction failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// A catalog query returned a value with no catalog representation.
    #[error("Unsupported value of type {type_name} in column {column}")]
    UnsupportedValue {
        /// 0-based column.
        column: usize,
        /// SQLite storage class.
        type_name: String,
    },
}

/// Result type for SQLite operations.
pub type Result<T> = std::result::Result<T, SqliteError>;
