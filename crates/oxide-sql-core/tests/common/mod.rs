#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;

use oxide_sql_core::extract::{
    AsyncCatalogSource, CatalogDialect, CatalogRow, CatalogSource, ExtractionTarget, SourceError,
};
use oxide_sql_core::model::{
    Catalog, Constraint, ForeignKey, QualifiedName, SqlType, SqlValueType, Table, TableColumn,
};

/// Serves canned rows for the queries of one catalog dialect.
pub struct MemorySource<'d> {
    dialect: &'d dyn CatalogDialect,
    rows: BTreeMap<ExtractionTarget, Vec<CatalogRow>>,
    pub executed: Vec<ExtractionTarget>,
}

impl<'d> MemorySource<'d> {
    pub fn new(dialect: &'d dyn CatalogDialect) -> Self {
        Self {
            dialect,
            rows: BTreeMap::new(),
            executed: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, target: ExtractionTarget, rows: Vec<CatalogRow>) -> Self {
        self.rows.insert(target, rows);
        self
    }

    fn answer(&mut self, sql: &str) -> Result<Vec<CatalogRow>, SourceError> {
        let target = ExtractionTarget::ALL
            .into_iter()
            .find(|target| self.dialect.query(*target).as_deref() == Some(sql))
            .ok_or_else(|| format!("unexpected query: {sql}"))?;
        self.executed.push(target);
        Ok(self.rows.get(&target).cloned().unwrap_or_default())
    }
}

impl CatalogSource for MemorySource<'_> {
    fn fetch(&mut self, sql: &str) -> Result<Vec<CatalogRow>, SourceError> {
        self.answer(sql)
    }
}

impl AsyncCatalogSource for MemorySource<'_> {
    fn fetch(
        &mut self,
        sql: &str,
    ) -> impl Future<Output = Result<Vec<CatalogRow>, SourceError>> + Send {
        let rows = self.answer(sql);
        async move { rows }
    }
}

pub fn customers() -> Table {
    let mut table = Table::new("customers");
    table
        .add_column(TableColumn::new("id", SqlType::Int32).not_null())
        .unwrap();
    table.create_column("name", SqlValueType::varchar(100)).unwrap();
    table.create_primary_key("pk_customers", &["id"]).unwrap();
    table
}

pub fn orders() -> Table {
    let mut table = Table::new("orders");
    table
        .add_column(TableColumn::new("id", SqlType::Int32).not_null())
        .unwrap();
    table.create_column("customer_id", SqlType::Int32).unwrap();
    table
        .create_column("total", SqlValueType::decimal(10, 2))
        .unwrap();
    table.create_primary_key("pk_orders", &["id"]).unwrap();
    table
        .add_constraint(Constraint::foreign_key(
            "fk_orders_customers",
            ForeignKey::new(QualifiedName::new("main", "customers"))
                .with_columns("customer_id", "id"),
        ))
        .unwrap();
    table
}

/// A `shop` catalog with the given tables in schema `main`.
pub fn shop(tables: Vec<Table>) -> Catalog {
    let mut catalog = Catalog::new("shop");
    let main = catalog.create_schema("main").unwrap();
    for table in tables {
        main.add_table(table).unwrap();
    }
    catalog
}
