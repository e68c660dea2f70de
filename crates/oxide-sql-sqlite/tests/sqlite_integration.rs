//! Round trips against an in-memory SQLite database.

mod common;

use common::{create_runner, shop};
use oxide_sql_core::ast::{SqlExpression, SqlFunction};
use oxide_sql_core::compiler::CompiledCommand;
use oxide_sql_core::extract::{AsyncCatalogSource, CatalogValue};
use oxide_sql_core::model::{Named, QualifiedName, SqlType, SqlValueType};
use oxide_sql_core::upgrade::{compare, UpgradeMode, UpgradePlanner};
use oxide_sql_sqlite::SqliteCatalogSource;

#[tokio::test]
async fn test_empty_database_extracts_main_schema() {
    let runner = create_runner().await;
    let catalog = runner.extract("db").await.unwrap();
    assert_eq!(catalog.default_schema_name(), Some("main"));
    assert_eq!(catalog.all_tables().count(), 0);
}

#[tokio::test]
async fn test_values_keep_their_storage_class() {
    let runner = create_runner().await;
    let mut source = SqliteCatalogSource::new(runner.pool().clone());
    let rows = source
        .fetch("SELECT 1, 'main', NULL, 2.5")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.value(0), &CatalogValue::Integer(1));
    assert_eq!(row.value(1), &CatalogValue::Text("main".to_string()));
    assert_eq!(row.value(2), &CatalogValue::Null);
    assert_eq!(row.value(3), &CatalogValue::Real(2.5));
}

#[tokio::test]
async fn test_planned_schema_round_trips() {
    let runner = create_runner().await;
    let target = shop();
    let live = runner.extract("shop").await.unwrap();

    let plan = UpgradePlanner::new()
        .inline_foreign_keys(true)
        .plan(&live, &target)
        .unwrap();
    for command in plan.compile(runner.dialect()).unwrap() {
        runner.execute(&command).await.unwrap();
    }

    let extracted = runner.extract("shop").await.unwrap();
    let diff = compare(&extracted, &target, &[]).unwrap();
    assert!(diff.is_empty(), "{diff:#?}");

    let orders = extracted
        .table(&QualifiedName::new("main", "orders"))
        .unwrap();
    assert_eq!(
        orders.column("total").unwrap().data_type,
        SqlValueType::decimal(10, 2)
    );
    assert_eq!(orders.primary_key().unwrap().name(), "PK_orders");
    assert_eq!(orders.foreign_keys().count(), 1);
}

#[tokio::test]
async fn test_added_column_is_applied() {
    let runner = create_runner().await;
    let mut target = shop();
    let plan = UpgradePlanner::new()
        .inline_foreign_keys(true)
        .plan(&runner.extract("shop").await.unwrap(), &target)
        .unwrap();
    for command in plan.compile(runner.dialect()).unwrap() {
        runner.execute(&command).await.unwrap();
    }

    target
        .table_mut(&QualifiedName::new("main", "customers"))
        .unwrap()
        .create_column("email", SqlType::VarCharMax)
        .unwrap();
    let live = runner.extract("shop").await.unwrap();
    let plan = UpgradePlanner::new()
        .mode(UpgradeMode::PerformSafely)
        .plan(&live, &target)
        .unwrap();
    assert_eq!(plan.len(), 1);
    for command in plan.compile(runner.dialect()).unwrap() {
        runner.execute(&command).await.unwrap();
    }

    let extracted = runner.extract("shop").await.unwrap();
    assert!(compare(&extracted, &target, &[]).unwrap().is_empty());
}

#[tokio::test]
async fn test_date_construction_evaluates() {
    let runner = create_runner().await;
    let date = SqlExpression::function(
        SqlFunction::DateTimeConstruct,
        vec![
            SqlExpression::literal(2005),
            SqlExpression::literal(3),
            SqlExpression::literal(10),
        ],
    );
    let value = runner.evaluate(&date).await.unwrap().unwrap();
    assert!(value.starts_with("2005-03-10"), "{value}");
}

#[tokio::test]
async fn test_parameters_are_bound() {
    let runner = create_runner().await;
    let sum = SqlExpression::parameter(40).add(SqlExpression::literal(2));
    assert_eq!(runner.evaluate(&sum).await.unwrap().as_deref(), Some("42"));
}

#[tokio::test]
async fn test_failed_batch_is_rolled_back() {
    let runner = create_runner().await;
    let commands = [
        CompiledCommand {
            text: "CREATE TABLE \"t\" (\"x\" INT)".to_string(),
            parameters: Vec::new(),
        },
        CompiledCommand {
            text: "INSERT INTO \"missing\" VALUES (1)".to_string(),
            parameters: Vec::new(),
        },
    ];
    assert!(runner.execute_all(&commands).await.is_err());

    let catalog = runner.extract("db").await.unwrap();
    assert_eq!(catalog.all_tables().count(), 0);
}

#[tokio::test]
async fn test_foreign_key_to_implicit_primary_key() {
    let runner = create_runner().await;
    let commands = [
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT)",
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER REFERENCES customers)",
    ]
    .map(|text| CompiledCommand {
        text: text.to_string(),
        parameters: Vec::new(),
    });
    runner.execute_all(&commands).await.unwrap();

    let catalog = runner.extract("db").await.unwrap();
    let orders = catalog.table(&QualifiedName::new("main", "orders")).unwrap();
    let (_, fk) = orders.foreign_keys().next().unwrap();
    assert_eq!(fk.referenced_table, QualifiedName::new("main", "customers"));
    assert_eq!(fk.column_pairs().collect::<Vec<_>>(), [("customer_id", "id")]);
}
