//! Schema integrity errors.

use super::collection::NodeKind;

/// Errors raised while building or validating a schema object graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A child with the same name already exists in the parent collection.
    #[error("{kind} '{name}' already exists in '{parent}'")]
    DuplicateName {
        /// Kind of the node being added.
        kind: NodeKind,
        /// The colliding name.
        name: String,
        /// Name of the owning node.
        parent: String,
    },

    /// A named node could not be found in its parent.
    #[error("{kind} '{name}' not found in '{parent}'")]
    NotFound {
        /// Kind of the missing node.
        kind: NodeKind,
        /// The name that was looked up.
        name: String,
        /// Name of the owning node.
        parent: String,
    },

    /// A table already has a primary key.
    #[error("table '{table}' already has primary key '{existing}'")]
    MultiplePrimaryKeys {
        /// The table.
        table: String,
        /// Name of the existing primary key.
        existing: String,
    },

    /// Foreign key column lists differ in length.
    #[error("foreign key '{name}' has {referencing} referencing and {referenced} referenced columns")]
    ColumnCountMismatch {
        /// The foreign key.
        name: String,
        /// Number of referencing columns.
        referencing: usize,
        /// Number of referenced columns.
        referenced: usize,
    },

    /// A cross reference points at a node that does not exist.
    #[error("{owner} references missing {target}")]
    DanglingReference {
        /// Description of the referencing node.
        owner: String,
        /// Description of the missing target.
        target: String,
    },

    /// The catalog has no default schema.
    #[error("catalog '{0}' has no default schema")]
    NoDefaultSchema(String),

    /// Several integrity problems were found at once.
    #[error("Multiple model errors:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<ModelError>),
}

/// Result type for schema model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
