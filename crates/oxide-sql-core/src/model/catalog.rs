//! Catalogs and schemas.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::collection::{Named, NodeCollection, NodeKind, Rename};
use super::constraint::ConstraintKind;
use super::error::{ModelError, Result};
use super::sequence::Sequence;
use super::table::Table;
use super::types::SqlValueType;
use super::view::View;

/// A schema-qualified object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Owning schema.
    pub schema: String,
    /// Object name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A character set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSet {
    name: String,
    /// Existing character set this one is derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CharacterSet {
    /// Creates a character set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
        }
    }
}

/// A collation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collation {
    name: String,
    /// Character set the collation applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_set: Option<String>,
    /// Existing collation this one copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Collation {
    /// Creates a collation.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            character_set: None,
            source: None,
        }
    }
}

/// Which side of a range a boundary value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionBoundary {
    /// Boundary values close the lower partition.
    #[default]
    Left,
    /// Boundary values open the upper partition.
    Right,
}

/// A range partition function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionFunction {
    name: String,
    /// Type of the partitioning column.
    pub data_type: SqlValueType,
    /// Range side.
    #[serde(default)]
    pub boundary: PartitionBoundary,
    /// Boundary values as SQL literals.
    #[serde(default)]
    pub boundary_values: Vec<String>,
}

impl PartitionFunction {
    /// Creates a partition function without boundaries.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: SqlValueType) -> Self {
        Self {
            name: name.into(),
            data_type,
            boundary: PartitionBoundary::Left,
            boundary_values: Vec::new(),
        }
    }
}

macro_rules! named {
    ($ty:ty, $kind:expr) => {
        impl Named for $ty {
            const KIND: NodeKind = $kind;

            fn name(&self) -> &str {
                &self.name
            }
        }

        impl Rename for $ty {
            fn set_name(&mut self, name: String) {
                self.name = name;
            }
        }
    };
}

named!(CharacterSet, NodeKind::CharacterSet);
named!(Collation, NodeKind::Collation);
named!(PartitionFunction, NodeKind::PartitionFunction);

/// A schema: the namespace holding tables, views and sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    #[serde(default)]
    tables: NodeCollection<Table>,
    #[serde(default)]
    views: NodeCollection<View>,
    #[serde(default)]
    sequences: NodeCollection<Sequence>,
    #[serde(default)]
    character_sets: NodeCollection<CharacterSet>,
    #[serde(default)]
    collations: NodeCollection<Collation>,
    #[serde(default)]
    partition_functions: NodeCollection<PartitionFunction>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: NodeCollection::new(),
            views: NodeCollection::new(),
            sequences: NodeCollection::new(),
            character_sets: NodeCollection::new(),
            collations: NodeCollection::new(),
            partition_functions: NodeCollection::new(),
        }
    }

    /// Qualifies a child name with this schema.
    #[must_use]
    pub fn qualify(&self, name: &str) -> QualifiedName {
        QualifiedName::new(self.name.as_str(), name)
    }

    // ---- tables ----

    /// Tables in creation order.
    #[must_use]
    pub const fn tables(&self) -> &NodeCollection<Table> {
        &self.tables
    }

    /// Looks up a table.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Looks up a table for mutation.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    /// Creates an empty regular table.
    pub fn create_table(&mut self, name: impl Into<String>) -> Result<&mut Table> {
        self.add_table(Table::new(name))
    }

    /// Creates an empty temporary table.
    pub fn create_temporary_table(
        &mut self,
        name: impl Into<String>,
        is_global: bool,
        preserve_rows: bool,
    ) -> Result<&mut Table> {
        self.add_table(Table::temporary(name, is_global, preserve_rows))
    }

    /// Attaches a prepared table.
    pub fn add_table(&mut self, table: Table) -> Result<&mut Table> {
        self.tables.push(&self.name, table)
    }

    /// Removes a table.
    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    // ---- views ----

    /// Views in creation order.
    #[must_use]
    pub const fn views(&self) -> &NodeCollection<View> {
        &self.views
    }

    /// Looks up a view.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    /// Looks up a view for mutation.
    pub fn view_mut(&mut self, name: &str) -> Option<&mut View> {
        self.views.get_mut(name)
    }

    /// Creates an empty view.
    pub fn create_view(&mut self, name: impl Into<String>) -> Result<&mut View> {
        self.add_view(View::new(name))
    }

    /// Attaches a prepared view.
    pub fn add_view(&mut self, view: View) -> Result<&mut View> {
        self.views.push(&self.name, view)
    }

    /// Removes a view.
    pub fn remove_view(&mut self, name: &str) -> Option<View> {
        self.views.remove(name)
    }

    // ---- sequences ----

    /// Sequences in creation order.
    #[must_use]
    pub const fn sequences(&self) -> &NodeCollection<Sequence> {
        &self.sequences
    }

    /// Looks up a sequence.
    #[must_use]
    pub fn sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences.get(name)
    }

    /// Creates a sequence with default settings.
    pub fn create_sequence(&mut self, name: impl Into<String>) -> Result<&mut Sequence> {
        self.add_sequence(Sequence::new(name))
    }

    /// Attaches a prepared sequence.
    pub fn add_sequence(&mut self, sequence: Sequence) -> Result<&mut Sequence> {
        self.sequences.push(&self.name, sequence)
    }

    /// Removes a sequence.
    pub fn remove_sequence(&mut self, name: &str) -> Option<Sequence> {
        self.sequences.remove(name)
    }

    // ---- vendor objects ----

    /// Character sets.
    #[must_use]
    pub const fn character_sets(&self) -> &NodeCollection<CharacterSet> {
        &self.character_sets
    }

    /// Creates a character set.
    pub fn create_character_set(&mut self, name: impl Into<String>) -> Result<&mut CharacterSet> {
        self.character_sets.push(&self.name, CharacterSet::new(name))
    }

    /// Collations.
    #[must_use]
    pub const fn collations(&self) -> &NodeCollection<Collation> {
        &self.collations
    }

    /// Creates a collation.
    pub fn create_collation(&mut self, name: impl Into<String>) -> Result<&mut Collation> {
        self.collations.push(&self.name, Collation::new(name))
    }

    /// Partition functions.
    #[must_use]
    pub const fn partition_functions(&self) -> &NodeCollection<PartitionFunction> {
        &self.partition_functions
    }

    /// Creates a partition function.
    pub fn create_partition_function(
        &mut self,
        name: impl Into<String>,
        data_type: SqlValueType,
    ) -> Result<&mut PartitionFunction> {
        self.partition_functions
            .push(&self.name, PartitionFunction::new(name, data_type))
    }

    pub(crate) fn tables_mut(&mut self) -> &mut NodeCollection<Table> {
        &mut self.tables
    }
}

impl Named for Schema {
    const KIND: NodeKind = NodeKind::Schema;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Rename for Schema {
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// The root of a schema object graph: one physical database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_schema: Option<String>,
    #[serde(default)]
    schemas: NodeCollection<Schema>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_schema: None,
            schemas: NodeCollection::new(),
        }
    }

    /// The catalog (database) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schemas in creation order.
    #[must_use]
    pub const fn schemas(&self) -> &NodeCollection<Schema> {
        &self.schemas
    }

    /// Looks up a schema.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Looks up a schema for mutation.
    pub fn schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas.get_mut(name)
    }

    /// Creates a schema. The first schema becomes the default one.
    pub fn create_schema(&mut self, name: impl Into<String>) -> Result<&mut Schema> {
        let name = name.into();
        if self.default_schema.is_none() && !self.schemas.contains(&name) {
            self.default_schema = Some(name.clone());
        }
        self.schemas.push(&self.name, Schema::new(name))
    }

    /// Returns the schema, creating it when missing.
    pub fn ensure_schema(&mut self, name: &str) -> &mut Schema {
        if self.default_schema.is_none() {
            self.default_schema = Some(name.to_string());
        }
        self.schemas.get_or_insert_with(name, || Schema::new(name))
    }

    /// Name of the default schema.
    #[must_use]
    pub fn default_schema_name(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    /// The default schema.
    #[must_use]
    pub fn default_schema(&self) -> Option<&Schema> {
        self.default_schema.as_deref().and_then(|name| self.schema(name))
    }

    /// Selects an existing schema as the default.
    pub fn set_default_schema(&mut self, name: &str) -> Result<()> {
        if !self.schemas.contains(name) {
            return Err(ModelError::NotFound {
                kind: NodeKind::Schema,
                name: name.to_string(),
                parent: self.name.clone(),
            });
        }
        self.default_schema = Some(name.to_string());
        Ok(())
    }

    /// Removes a schema and everything it owns.
    pub fn remove_schema(&mut self, name: &str) -> Option<Schema> {
        let removed = self.schemas.remove(name)?;
        if self.default_schema.as_deref() == Some(name) {
            self.default_schema = self.schemas.names().next().map(str::to_string);
        }
        Some(removed)
    }

    /// Resolves a qualified table name.
    #[must_use]
    pub fn table(&self, name: &QualifiedName) -> Option<&Table> {
        self.schema(&name.schema)?.table(&name.name)
    }

    /// Resolves a qualified table name for mutation.
    pub fn table_mut(&mut self, name: &QualifiedName) -> Option<&mut Table> {
        self.schema_mut(&name.schema)?.table_mut(&name.name)
    }

    /// Iterates over every table with its qualified name.
    pub fn all_tables(&self) -> impl Iterator<Item = (QualifiedName, &Table)> {
        self.schemas.iter().flat_map(|schema| {
            schema
                .tables()
                .iter()
                .map(move |table| (schema.qualify(table.name()), table))
        })
    }

    /// Renames a table and retargets foreign keys that reference it.
    pub fn rename_table(&mut self, table: &QualifiedName, new_name: &str) -> Result<()> {
        let catalog = self.name.clone();
        let schema = self
            .schemas
            .get_mut(&table.schema)
            .ok_or_else(|| not_found(NodeKind::Schema, &table.schema, &catalog))?;
        schema.tables_mut().rename(&table.schema, &table.name, new_name)?;
        let renamed = QualifiedName::new(table.schema.as_str(), new_name);
        self.for_each_table_mut(|t| t.retarget_foreign_keys(table, &renamed));
        Ok(())
    }

    /// Renames a column and every key, local or foreign, that uses it.
    pub fn rename_column(&mut self, table: &QualifiedName, old: &str, new: &str) -> Result<()> {
        let catalog = self.name.clone();
        self.table_mut(table)
            .ok_or_else(|| not_found(NodeKind::Table, &table.to_string(), &catalog))?
            .rename_column(old, new)?;
        self.for_each_table_mut(|t| t.rename_referenced_column(table, old, new));
        Ok(())
    }

    fn for_each_table_mut(&mut self, mut f: impl FnMut(&mut Table)) {
        for schema in self.schemas.iter_mut() {
            for table in schema.tables_mut().iter_mut() {
                f(table);
            }
        }
    }

    /// Checks every cross reference in the graph, reporting all problems.
    pub fn validate(&self) -> Result<()> {
        self.check(|_| false)
    }

    /// Like [`Catalog::validate`], but a foreign key into a schema this
    /// catalog does not hold is accepted as an outside reference. Catalogs
    /// extracted with a schema filter are checked this way.
    pub fn validate_partial(&self) -> Result<()> {
        self.check(|target| self.schema(&target.schema).is_none())
    }

    fn check(&self, is_outside: impl Fn(&QualifiedName) -> bool) -> Result<()> {
        let mut errors = Vec::new();
        for (name, table) in self.all_tables() {
            let mut keys = table.constraints().iter().filter(|c| c.is_primary_key());
            if let (Some(first), Some(_)) = (keys.next(), keys.next()) {
                errors.push(ModelError::MultiplePrimaryKeys {
                    table: name.to_string(),
                    existing: first.name().to_string(),
                });
            }
            for index in table.indexes() {
                for column in index.column_names() {
                    if table.column(column).is_none() {
                        errors.push(dangling(
                            format!("index '{}' on {name}", index.name()),
                            format!("column '{column}'"),
                        ));
                    }
                }
            }
            for constraint in table.constraints() {
                let owner = format!("constraint '{}' on {name}", constraint.name());
                for column in constraint.local_columns() {
                    if table.column(column).is_none() {
                        errors.push(dangling(owner.clone(), format!("column '{column}'")));
                    }
                }
                let ConstraintKind::ForeignKey(fk) = &constraint.kind else {
                    continue;
                };
                if fk.columns().len() != fk.referenced_columns().len() {
                    errors.push(ModelError::ColumnCountMismatch {
                        name: constraint.name().to_string(),
                        referencing: fk.columns().len(),
                        referenced: fk.referenced_columns().len(),
                    });
                }
                if is_outside(&fk.referenced_table) {
                    continue;
                }
                match self.table(&fk.referenced_table) {
                    None => errors.push(dangling(
                        owner,
                        format!("table {}", fk.referenced_table),
                    )),
                    Some(referenced) => {
                        for column in fk.referenced_columns() {
                            if referenced.column(column).is_none() {
                                errors.push(dangling(
                                    owner.clone(),
                                    format!("column '{column}' of {}", fk.referenced_table),
                                ));
                            }
                        }
                    }
                }
            }
        }
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.swap_remove(0)),
            _ => Err(ModelError::Multiple(errors)),
        }
    }
}

fn not_found(kind: NodeKind, name: &str, parent: &str) -> ModelError {
    ModelError::NotFound {
        kind,
        name: name.to_string(),
        parent: parent.to_string(),
    }
}

const fn dangling(owner: String, target: String) -> ModelError {
    ModelError::DanglingReference { owner, target }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IndexColumn, SqlType};

    fn shop() -> Catalog {
        let mut catalog = Catalog::new("shop");
        let schema = catalog.create_schema("main").unwrap();
        let customers = schema.create_table("customers").unwrap();
        customers.create_column("id", SqlType::Int32).unwrap();
        customers.create_primary_key("pk_customers", &["id"]).unwrap();
        let orders = schema.create_table("orders").unwrap();
        orders.create_column("id", SqlType::Int32).unwrap();
        orders.create_column("customer_id", SqlType::Int32).unwrap();
        orders
            .create_foreign_key("fk_orders_customer", QualifiedName::new("main", "customers"))
            .unwrap();
        orders
            .add_foreign_key_columns("fk_orders_customer", "customer_id", "id")
            .unwrap();
        catalog
    }

    #[test]
    fn test_first_schema_is_default() {
        let catalog = shop();
        assert_eq!(catalog.default_schema_name(), Some("main"));
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_clone_resolves_into_the_clone() {
        let original = shop();
        let mut copy = original.clone();
        assert_eq!(original, copy);
        copy.rename_table(&QualifiedName::new("main", "customers"), "clients")
            .unwrap();
        let orders = copy.table(&QualifiedName::new("main", "orders")).unwrap();
        let (_, fk) = orders.foreign_keys().next().unwrap();
        assert_eq!(fk.referenced_table, QualifiedName::new("main", "clients"));
        assert!(copy.table(&fk.referenced_table).is_some());
        let original_orders = original.table(&QualifiedName::new("main", "orders")).unwrap();
        let (_, original_fk) = original_orders.foreign_keys().next().unwrap();
        assert_eq!(original_fk.referenced_table.name, "customers");
        assert!(copy.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_dangling_reference() {
        let mut catalog = shop();
        let schema = catalog.schema_mut("main").unwrap();
        schema.remove_table("customers");
        let orders = schema.table_mut("orders").unwrap();
        orders
            .create_index("ix_customer", vec![IndexColumn::column("customer_id")])
            .unwrap();
        orders
            .create_foreign_key("fk_orders_self", QualifiedName::new("main", "orders"))
            .unwrap();
        orders
            .add_foreign_key_columns("fk_orders_self", "customer_id", "missing")
            .unwrap();
        match catalog.validate().unwrap_err() {
            ModelError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_loaded_table_with_two_primary_keys_is_rejected() {
        let mut json = serde_json::to_value(shop()).unwrap();
        let constraints = json["schemas"][0]["tables"][0]["constraints"]
            .as_array_mut()
            .unwrap();
        let mut second = constraints[0].clone();
        second["name"] = "pk_customers_again".into();
        constraints.push(second);

        let catalog: Catalog = serde_json::from_value(json).unwrap();
        match catalog.validate().unwrap_err() {
            ModelError::MultiplePrimaryKeys { table, existing } => {
                assert_eq!(table, "main.customers");
                assert_eq!(existing, "pk_customers");
            }
            other => panic!("expected a primary key error, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_validation_accepts_outside_schemas_only() {
        let mut catalog = shop();
        let orders = catalog
            .schema_mut("main")
            .unwrap()
            .table_mut("orders")
            .unwrap();
        orders
            .create_foreign_key("fk_orders_region", QualifiedName::new("geo", "regions"))
            .unwrap();
        orders
            .add_foreign_key_columns("fk_orders_region", "customer_id", "id")
            .unwrap();
        assert!(catalog.validate().is_err());
        assert!(catalog.validate_partial().is_ok());

        // A missing table inside a held schema is still an error.
        catalog.schema_mut("main").unwrap().remove_table("customers");
        assert!(matches!(
            catalog.validate_partial().unwrap_err(),
            ModelError::DanglingReference { .. }
        ));
    }

    #[test]
    fn test_rename_column_updates_foreign_keys() {
        let mut catalog = shop();
        catalog
            .rename_column(&QualifiedName::new("main", "customers"), "id", "customer_key")
            .unwrap();
        let orders = catalog.table(&QualifiedName::new("main", "orders")).unwrap();
        let (_, fk) = orders.foreign_keys().next().unwrap();
        assert_eq!(fk.referenced_columns(), ["customer_key".to_string()]);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_catalog_json_round_trip() {
        let catalog = shop();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn test_duplicate_names_rejected_on_load() {
        let json = r#"{"name":"db","schemas":[{"name":"main"},{"name":"main"}]}"#;
        assert!(serde_json::from_str::<Catalog>(json).is_err());
    }
}
