//! Optimizer hints.

use serde::{Deserialize, Serialize};

/// An advisory optimizer hint attached to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlHint {
    /// Optimize for returning the first `n` rows quickly.
    FastFirstRows(u32),
    /// Join tables in the order written.
    ForceJoinOrder,
    /// Vendor hint text, emitted verbatim where hints are supported.
    Native(String),
}
