//! Compilation errors.

/// Errors raised while rendering a tree for a dialect.
///
/// All of these are programming errors rather than data errors: the tree
/// asks for something the target cannot express, or is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The dialect has no rendering for a construct.
    #[error("{dialect} cannot compile {construct}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// Description of the construct.
        construct: String,
    },

    /// A column points at a table reference that is not in scope.
    #[error("column '{column}' references a table that is not in scope")]
    UnboundTableReference {
        /// Column name.
        column: String,
    },

    /// A function call has the wrong number of arguments.
    #[error("{function} expects {expected} arguments, got {actual}")]
    InvalidArgumentCount {
        /// Function name.
        function: &'static str,
        /// Accepted counts.
        expected: String,
        /// Supplied count.
        actual: usize,
    },

    /// The tree is structurally invalid.
    #[error("invalid node: {0}")]
    InvalidNode(String),

    /// A server version string could not be parsed.
    #[error("invalid server version '{0}'")]
    InvalidVersion(String),

    /// An unknown dialect name.
    #[error("unknown dialect '{0}'")]
    UnknownDialect(String),
}

impl CompileError {
    /// Shorthand for [`CompileError::Unsupported`].
    #[must_use]
    pub fn unsupported(dialect: &'static str, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect,
            construct: construct.into(),
        }
    }
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
