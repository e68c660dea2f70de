//! Single-pass row consumer that rebuilds the object graph.

use std::collections::HashSet;
use std::fmt;

use tracing::trace;

use super::decode::{self, KeyKind};
use super::error::{ExtractError, Result};
use super::row::CatalogRow;
use super::{CatalogDialect, ColumnType, ExtractionTarget};
use crate::model::{
    Catalog, Constraint, ForeignKey, Index, IndexColumn, ModelError, Named, NodeKind,
    QualifiedName, Sequence, SequenceDescriptor, Table, TableColumn, TableKind, View,
    ViewDefinition,
};

/// Owner of a row group: a table or view, optionally narrowed to a named
/// index or constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct GroupKey {
    pub(crate) owner: QualifiedName,
    pub(crate) name: Option<String>,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}.{name}", self.owner),
            None => write!(f, "{}", self.owner),
        }
    }
}

/// Outcome of feeding one row to a [`GroupTracker`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// The row continues the current group.
    Continue,
    /// The row opened a new group; carries the group it closed.
    Started(Option<GroupKey>),
}

/// Group-break detector for rows sorted by owner, then ordinal.
#[derive(Debug)]
pub(crate) struct GroupTracker {
    query: &'static str,
    current: Option<GroupKey>,
    last_ordinal: i64,
    completed: HashSet<GroupKey>,
}

impl GroupTracker {
    pub(crate) fn new(target: ExtractionTarget) -> Self {
        Self {
            query: target.as_str(),
            current: None,
            last_ordinal: i64::MAX,
            completed: HashSet::new(),
        }
    }

    pub(crate) fn advance(&mut self, key: GroupKey, ordinal: i64) -> Result<Step> {
        let same_owner = self.current.as_ref() == Some(&key);
        if same_owner && ordinal > self.last_ordinal {
            self.last_ordinal = ordinal;
            return Ok(Step::Continue);
        }
        if same_owner || self.completed.contains(&key) {
            return Err(ExtractError::UnsortedRows {
                query: self.query,
                owner: key.to_string(),
            });
        }
        self.last_ordinal = ordinal;
        let previous = self.current.replace(key);
        if let Some(previous) = &previous {
            self.completed.insert(previous.clone());
        }
        Ok(Step::Started(previous))
    }

    /// Closes the stream and returns the last open group.
    pub(crate) fn finish(&mut self) -> Option<GroupKey> {
        let last = self.current.take();
        if let Some(last) = &last {
            self.completed.insert(last.clone());
        }
        self.last_ordinal = i64::MAX;
        last
    }
}

#[derive(Debug)]
struct PendingKey {
    key: GroupKey,
    kind: KeyKind,
    columns: Vec<String>,
}

/// Extraction state threaded through every row of every query.
pub(crate) struct ExtractionState<'a> {
    dialect: &'a dyn CatalogDialect,
    catalog: Catalog,
    schemas: Option<&'a [String]>,
    tracker: GroupTracker,
    pending_key: Option<PendingKey>,
}

impl<'a> ExtractionState<'a> {
    pub(crate) fn new(
        dialect: &'a dyn CatalogDialect,
        name: &str,
        schemas: Option<&'a [String]>,
    ) -> Result<Self> {
        let mut catalog = Catalog::new(name);
        match schemas {
            Some(names) => {
                for schema in names {
                    catalog.create_schema(schema.as_str())?;
                }
            }
            None => {
                catalog.create_schema(dialect.default_schema())?;
            }
        }
        Ok(Self {
            dialect,
            catalog,
            schemas,
            tracker: GroupTracker::new(ExtractionTarget::Tables),
            pending_key: None,
        })
    }

    pub(crate) fn begin(&mut self, target: ExtractionTarget) {
        self.tracker = GroupTracker::new(target);
    }

    pub(crate) fn apply(&mut self, target: ExtractionTarget, row: &CatalogRow) -> Result<()> {
        let Some(schema) = self.schema(row, 0)? else {
            return Ok(());
        };
        match target {
            ExtractionTarget::Tables => self.table(schema, row),
            ExtractionTarget::Columns => self.column(schema, row),
            ExtractionTarget::Views => self.view(schema, row),
            ExtractionTarget::ViewColumns => self.view_column(schema, row),
            ExtractionTarget::Indexes => self.index(schema, row),
            ExtractionTarget::ForeignKeys => self.foreign_key(schema, row),
            ExtractionTarget::CheckConstraints => self.check(schema, row),
            ExtractionTarget::KeyConstraints => self.key(schema, row),
            ExtractionTarget::Sequences => self.sequence(schema, row),
        }
    }

    /// Ends a query; key constraints flush the group still open.
    pub(crate) fn finish(&mut self, target: ExtractionTarget) -> Result<()> {
        self.tracker.finish();
        if target == ExtractionTarget::KeyConstraints {
            self.flush_key()?;
        }
        Ok(())
    }

    pub(crate) fn into_catalog(self) -> Catalog {
        self.catalog
    }

    // ---- row handlers ----

    fn table(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let name = row.required_text(1)?;
        let table = match self.dialect.table_kind(row.value(2))? {
            TableKind::Regular => Table::new(name),
            TableKind::Temporary {
                is_global,
                preserve_rows,
            } => Table::temporary(name, is_global, preserve_rows),
        };
        trace!(schema = %schema, table = table.name(), "Extracted table");
        self.catalog.ensure_schema(&schema).add_table(table)?;
        Ok(())
    }

    fn column(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let owner = QualifiedName::new(schema, row.required_text(1)?);
        let ordinal = row.integer(2)?.unwrap_or_default();
        self.tracker.advance(GroupKey { owner: owner.clone(), name: None }, ordinal)?;

        let flags = self.dialect.boolean_encoding();
        let data_type = self.dialect.value_type(&ColumnType {
            code: row.integer(4)?,
            subcode: row.integer(5)?,
            name: row.text(6)?,
            precision: row.unsigned(7)?,
            scale: row.unsigned(8)?,
            length: row.unsigned(9)?,
        })?;
        let mut column = TableColumn::new(row.required_text(3)?, data_type);
        column.is_nullable = flags.decode(row.value(10))?;
        column.default_value = row
            .text(11)?
            .and_then(|text| self.dialect.default_value(&text));
        column.collation = row.text(12)?;
        if flags.decode(row.value(13))? {
            column.identity = Some(SequenceDescriptor::new(1, 1));
        }
        table_mut(&mut self.catalog, &owner)?.add_column(column)?;
        Ok(())
    }

    fn view(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let mut view = View::new(row.required_text(1)?);
        if let Some(definition) = row.text(2)? {
            view = view.with_definition(ViewDefinition::Native(definition));
        }
        self.catalog.ensure_schema(&schema).add_view(view)?;
        Ok(())
    }

    fn view_column(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let owner = QualifiedName::new(schema, row.required_text(1)?);
        let ordinal = row.integer(2)?.unwrap_or_default();
        self.tracker.advance(GroupKey { owner: owner.clone(), name: None }, ordinal)?;
        let view = self
            .catalog
            .schema_mut(&owner.schema)
            .and_then(|s| s.view_mut(&owner.name))
            .ok_or_else(|| not_found(NodeKind::View, &owner))?;
        view.create_column(row.required_text(3)?)?;
        Ok(())
    }

    fn index(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let owner = QualifiedName::new(schema, row.required_text(1)?);
        let name = row.required_text(2)?;
        let ordinal = row.integer(3)?.unwrap_or_default();
        let key = GroupKey {
            owner: owner.clone(),
            name: Some(name.clone()),
        };
        let flags = self.dialect.boolean_encoding();
        let step = self.tracker.advance(key, ordinal)?;
        let table = table_mut(&mut self.catalog, &owner)?;

        if matches!(step, Step::Started(_)) {
            let mut index = Index::new(name.as_str());
            index.is_unique = flags.decode(row.value(7))?;
            index.is_clustered = flags.decode(row.value(9))?;
            index.fill_factor = row.unsigned(10)?;
            index.filter = row.text(8)?.map(|text| self.dialect.index_filter(&text));
            table.add_index(index)?;
        }

        let column = match (row.text(4)?, row.text(5)?) {
            (Some(column), _) => IndexColumn::column(column),
            (None, Some(expression)) => {
                IndexColumn::expression(self.dialect.index_expression(&expression))
            }
            (None, None) => {
                return Err(ExtractError::UnexpectedValue {
                    column: 4,
                    expected: "index column or expression",
                });
            }
        };
        let column = if flags.decode(row.value(6))? {
            column.descending()
        } else {
            column
        };
        table.add_index_column(&name, column)?;
        Ok(())
    }

    fn foreign_key(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let owner = QualifiedName::new(schema, row.required_text(1)?);
        let name = row.required_text(2)?;
        let ordinal = row.integer(3)?.unwrap_or_default();
        let key = GroupKey {
            owner: owner.clone(),
            name: Some(name.clone()),
        };
        let step = self.tracker.advance(key, ordinal)?;

        if matches!(step, Step::Started(_)) {
            let referenced = QualifiedName::new(
                row.text(5)?
                    .unwrap_or_else(|| self.dialect.default_schema().to_string()),
                row.required_text(6)?,
            );
            let flags = self.dialect.boolean_encoding();
            let mut foreign_key = ForeignKey::new(referenced)
                .on_delete(decode::referential_action(row.text(8)?.as_deref())?);
            foreign_key.on_update = decode::referential_action(row.text(9)?.as_deref())?;
            let mut constraint = Constraint::foreign_key(name.as_str(), foreign_key);
            if flags.decode(row.value(10))? {
                constraint = constraint.deferrable(flags.decode(row.value(11))?);
            }
            table_mut(&mut self.catalog, &owner)?.add_constraint(constraint)?;
        }

        table_mut(&mut self.catalog, &owner)?.add_foreign_key_columns(
            &name,
            &row.required_text(4)?,
            &row.required_text(7)?,
        )?;
        Ok(())
    }

    fn check(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let owner = QualifiedName::new(schema, row.required_text(1)?);
        let condition = self.dialect.check_condition(&row.required_text(3)?);
        table_mut(&mut self.catalog, &owner)?
            .add_constraint(Constraint::check(row.required_text(2)?, condition))?;
        Ok(())
    }

    fn key(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let owner = QualifiedName::new(schema, row.required_text(1)?);
        let key = GroupKey {
            owner,
            name: Some(row.required_text(2)?),
        };
        let kind = KeyKind::decode(&row.required_text(3)?)?;
        let ordinal = row.integer(4)?.unwrap_or_default();
        if let Step::Started(_) = self.tracker.advance(key.clone(), ordinal)? {
            self.flush_key()?;
            self.pending_key = Some(PendingKey {
                key,
                kind,
                columns: Vec::new(),
            });
        }
        if let Some(pending) = &mut self.pending_key {
            pending.columns.push(row.required_text(5)?);
        }
        Ok(())
    }

    fn flush_key(&mut self) -> Result<()> {
        let Some(pending) = self.pending_key.take() else {
            return Ok(());
        };
        let Some(name) = pending.key.name else {
            return Ok(());
        };
        let columns: Vec<&str> = pending.columns.iter().map(String::as_str).collect();
        let constraint = match pending.kind {
            KeyKind::Primary => Constraint::primary_key(name, &columns),
            KeyKind::Unique => Constraint::unique(name, &columns),
        };
        table_mut(&mut self.catalog, &pending.key.owner)?.add_constraint(constraint)?;
        Ok(())
    }

    fn sequence(&mut self, schema: String, row: &CatalogRow) -> Result<()> {
        let descriptor = SequenceDescriptor {
            start_value: row.integer(2)?,
            increment: row.integer(3)?,
            min_value: row.integer(4)?,
            max_value: row.integer(5)?,
            is_cyclic: Some(self.dialect.boolean_encoding().decode(row.value(6))?),
        };
        let mut sequence = Sequence::new(row.required_text(1)?).with_descriptor(descriptor);
        sequence.current_value = row.integer(7)?;
        self.catalog.ensure_schema(&schema).add_sequence(sequence)?;
        Ok(())
    }

    // ---- helpers ----

    /// Schema of a row, or `None` when the schema filter excludes it.
    fn schema(&self, row: &CatalogRow, column: usize) -> Result<Option<String>> {
        let schema = row
            .text(column)?
            .unwrap_or_else(|| self.dialect.default_schema().to_string());
        Ok(match self.schemas {
            Some(names) if !names.iter().any(|n| *n == schema) => None,
            _ => Some(schema),
        })
    }
}

fn table_mut<'c>(catalog: &'c mut Catalog, name: &QualifiedName) -> Result<&'c mut Table> {
    catalog
        .table_mut(name)
        .ok_or_else(|| not_found(NodeKind::Table, name))
}

fn not_found(kind: NodeKind, name: &QualifiedName) -> ExtractError {
    ModelError::NotFound {
        kind,
        name: name.name.clone(),
        parent: name.schema.clone(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(table: &str) -> GroupKey {
        GroupKey {
            owner: QualifiedName::new("main", table),
            name: None,
        }
    }

    #[test]
    fn ordinal_reset_with_new_owner_starts_group() {
        let mut tracker = GroupTracker::new(ExtractionTarget::Columns);
        assert_eq!(tracker.advance(key("a"), 1).unwrap(), Step::Started(None));
        assert_eq!(tracker.advance(key("a"), 2).unwrap(), Step::Continue);
        assert_eq!(
            tracker.advance(key("b"), 1).unwrap(),
            Step::Started(Some(key("a")))
        );
    }

    #[test]
    fn owner_change_with_growing_ordinal_starts_group() {
        let mut tracker = GroupTracker::new(ExtractionTarget::Columns);
        tracker.advance(key("a"), 1).unwrap();
        assert_eq!(
            tracker.advance(key("b"), 5).unwrap(),
            Step::Started(Some(key("a")))
        );
    }

    #[test]
    fn repeated_ordinal_is_unsorted() {
        let mut tracker = GroupTracker::new(ExtractionTarget::Columns);
        tracker.advance(key("a"), 1).unwrap();
        let err = tracker.advance(key("a"), 1).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnsortedRows { query: "columns", owner } if owner == "main.a"
        ));
    }

    #[test]
    fn returning_owner_is_unsorted() {
        let mut tracker = GroupTracker::new(ExtractionTarget::Indexes);
        tracker.advance(key("a"), 1).unwrap();
        tracker.advance(key("b"), 1).unwrap();
        assert!(tracker.advance(key("a"), 2).is_err());
    }

    #[test]
    fn zero_based_ordinals_are_accepted() {
        let mut tracker = GroupTracker::new(ExtractionTarget::Columns);
        assert!(matches!(tracker.advance(key("a"), 0).unwrap(), Step::Started(_)));
        assert_eq!(tracker.advance(key("a"), 1).unwrap(), Step::Continue);
        assert_eq!(tracker.finish(), Some(key("a")));
        assert_eq!(tracker.finish(), None);
    }
}
