#![allow(dead_code)]

use oxide_sql_core::model::{
    Catalog, Constraint, ForeignKey, Index, IndexColumn, QualifiedName, SqlType, SqlValueType,
    Table, TableColumn,
};
use oxide_sql_sqlite::SqliteRunner;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub async fn create_test_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

pub async fn create_runner() -> SqliteRunner {
    SqliteRunner::connect(create_test_pool().await)
        .await
        .expect("Failed to read the SQLite version")
}

/// `customers` and `orders`, with a foreign key and an index.
pub fn shop() -> Catalog {
    let mut catalog = Catalog::new("shop");
    let main = catalog.create_schema("main").unwrap();

    let customers = main.create_table("customers").unwrap();
    customers
        .add_column(TableColumn::new("id", SqlType::Int32).not_null())
        .unwrap();
    customers
        .create_column("name", SqlValueType::varchar(100))
        .unwrap();
    customers.create_primary_key("pk_customers", &["id"]).unwrap();

    let mut orders = Table::new("orders");
    orders
        .add_column(TableColumn::new("id", SqlType::Int32).not_null())
        .unwrap();
    orders.create_column("customer_id", SqlType::Int32).unwrap();
    orders
        .create_column("total", SqlValueType::decimal(10, 2))
        .unwrap();
    orders.create_primary_key("pk_orders", &["id"]).unwrap();
    orders
        .add_constraint(Constraint::foreign_key(
            "fk_orders_customers",
            ForeignKey::new(QualifiedName::new("main", "customers"))
                .with_columns("customer_id", "id"),
        ))
        .unwrap();
    orders
        .add_index(Index::new("ix_orders_customer").with_column(IndexColumn::column("customer_id")))
        .unwrap();
    main.add_table(orders).unwrap();
    catalog
}
