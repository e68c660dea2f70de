//! Views.

use serde::{Deserialize, Serialize};

use super::catalog::QualifiedName;
use super::collection::{Named, NodeCollection, NodeKind, Rename};
use super::error::Result;
use crate::ast::SqlSelect;

/// A column exposed by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewColumn {
    name: String,
}

impl ViewColumn {
    /// Creates a view column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Named for ViewColumn {
    const KIND: NodeKind = NodeKind::ViewColumn;

    fn name(&self) -> &str {
        &self.name
    }
}

/// The body of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewDefinition {
    /// Vendor SQL text, kept verbatim.
    Native(String),
    /// A vendor-neutral query.
    Query(Box<SqlSelect>),
}

/// A view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    name: String,
    #[serde(default)]
    columns: NodeCollection<ViewColumn>,
    /// Query text or tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<ViewDefinition>,
}

impl View {
    /// Creates a view without columns or definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: NodeCollection::new(),
            definition: None,
        }
    }

    /// Sets the definition.
    #[must_use]
    pub fn with_definition(mut self, definition: ViewDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    /// Appends a column.
    pub fn create_column(&mut self, name: impl Into<String>) -> Result<&mut ViewColumn> {
        self.columns.push(&self.name, ViewColumn::new(name))
    }

    /// The view columns in order.
    #[must_use]
    pub const fn columns(&self) -> &NodeCollection<ViewColumn> {
        &self.columns
    }

    /// Whether the definition reads `table`. Native text is matched on the
    /// bare table name as a whole word, ignoring case.
    #[must_use]
    pub fn depends_on(&self, table: &QualifiedName) -> bool {
        match &self.definition {
            Some(ViewDefinition::Query(select)) => select.source_tables().contains(table),
            Some(ViewDefinition::Native(text)) => mentions(text, &table.name),
            None => false,
        }
    }
}

fn mentions(text: &str, word: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    text.split(|c: char| !is_word(c))
        .any(|token| token.eq_ignore_ascii_case(word))
}

impl Named for View {
    const KIND: NodeKind = NodeKind::View;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Rename for View {
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
