//! Catalog extraction errors.

use crate::model::ModelError;

/// Boxed transport error returned by a catalog source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while reading a live catalog into the object model.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A boolean flag used an encoding the dialect does not know.
    #[error("Invalid boolean value '{value}'")]
    InvalidBooleanValue {
        /// The raw catalog value.
        value: String,
    },

    /// A foreign key rule could not be decoded.
    #[error("Invalid referential action '{value}'")]
    InvalidReferentialAction {
        /// The raw catalog value.
        value: String,
    },

    /// A key constraint was neither a primary key nor a unique constraint.
    #[error("Unknown constraint type '{0}'")]
    UnknownConstraintType(String),

    /// A relation type code that does not describe a table.
    #[error("Unknown table kind '{0}'")]
    UnknownTableKind(String),

    /// Rows of a catalog query were not sorted by owner and ordinal.
    #[error("Rows of the {query} query are not sorted: '{owner}' appears twice")]
    UnsortedRows {
        /// The extraction query.
        query: &'static str,
        /// Owner whose group was interrupted.
        owner: String,
    },

    /// A column held a value of the wrong shape.
    #[error("Column {column} of catalog row: expected {expected}")]
    UnexpectedValue {
        /// Zero-based position in the canonical layout.
        column: usize,
        /// What the decoder needed.
        expected: &'static str,
    },

    /// The extracted graph broke a model invariant.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The connection failed.
    #[error("Catalog source error: {0}")]
    Source(#[source] SourceError),

    /// Extraction was cancelled between two queries or rows.
    #[error("Extraction cancelled")]
    Cancelled,
}

/// Result type for catalog extraction.
pub type Result<T> = std::result::Result<T, ExtractError>;
