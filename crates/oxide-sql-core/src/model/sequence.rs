//! Sequences and identity descriptors.

use serde::{Deserialize, Serialize};

use super::collection::{Named, NodeKind, Rename};
use super::types::SqlValueType;

/// Generator settings shared by sequences and identity columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceDescriptor {
    /// First value produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_value: Option<i64>,
    /// Step between values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<i64>,
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    /// Wraps around at the bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_cyclic: Option<bool>,
}

impl SequenceDescriptor {
    /// Descriptor with a start value and increment only.
    #[must_use]
    pub const fn new(start_value: i64, increment: i64) -> Self {
        Self {
            start_value: Some(start_value),
            increment: Some(increment),
            min_value: None,
            max_value: None,
            is_cyclic: None,
        }
    }

    /// Sets both bounds.
    #[must_use]
    pub const fn bounded(mut self, min_value: i64, max_value: i64) -> Self {
        self.min_value = Some(min_value);
        self.max_value = Some(max_value);
        self
    }

    /// Sets the cycle flag.
    #[must_use]
    pub const fn cyclic(mut self, is_cyclic: bool) -> Self {
        self.is_cyclic = Some(is_cyclic);
        self
    }
}

/// A named sequence generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    name: String,
    /// Generator settings.
    #[serde(default)]
    pub descriptor: SequenceDescriptor,
    /// Value type, when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<SqlValueType>,
    /// Last value handed out, as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<i64>,
}

impl Sequence {
    /// Creates a sequence with default settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: SequenceDescriptor::default(),
            data_type: None,
            current_value: None,
        }
    }

    /// Sets the descriptor.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: SequenceDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }
}

impl Named for Sequence {
    const KIND: NodeKind = NodeKind::Sequence;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Rename for Sequence {
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
