//! Data-loss checks collected while planning.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::path::NodePath;
use crate::model::SqlValueType;

/// Why an action may lose data or cannot be applied as planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum UnsafeReason {
    /// A table is dropped without a removal hint.
    DropTable,
    /// A column is dropped without a removal hint.
    DropColumn,
    /// A column type narrows or changes family.
    NarrowingType {
        /// Current type.
        old: SqlValueType,
        /// Target type.
        new: SqlValueType,
    },
    /// A nullable column without default becomes NOT NULL.
    NotNullWithoutDefault,
    /// A table changes between permanent and temporary and is recreated.
    TableKindChange,
    /// A property no ALTER statement can change in place.
    Unrepresentable {
        /// The property.
        property: String,
    },
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropTable => f.write_str("table would be dropped"),
            Self::DropColumn => f.write_str("column would be dropped"),
            Self::NarrowingType { old, new } => {
                write!(f, "type change from {old} to {new} may lose data")
            }
            Self::NotNullWithoutDefault => {
                f.write_str("column becomes NOT NULL without a default value")
            }
            Self::TableKindChange => f.write_str("table kind change recreates the table"),
            Self::Unrepresentable { property } => {
                write!(f, "{property} cannot be changed in place")
            }
        }
    }
}

/// One finding of the safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Affected node.
    pub path: NodePath,
    /// Finding.
    #[serde(flatten)]
    pub reason: UnsafeReason,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Every unsafe finding of one plan, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub(crate) fn push(&mut self, path: NodePath, reason: UnsafeReason) {
        self.issues.push(ValidationIssue { path, reason });
    }

    /// The findings in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Returns true when nothing unsafe was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.issues.iter().map(|i| format!("  - {i}")).collect();
        f.write_str(&lines.join("\n"))
    }
}
