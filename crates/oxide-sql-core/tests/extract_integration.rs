//! Extraction against canned catalog rows.

mod common;

use common::MemorySource;
use oxide_sql_core::catalog_row;
use oxide_sql_core::extract::{
    CancellationFlag, CatalogExtractor, CatalogRow, ExtractError, ExtractionTarget,
    PostgresCatalog, SqliteCatalog,
};
use oxide_sql_core::model::{
    ConstraintKind, Named, QualifiedName, ReferentialAction, SqlType, SqlValueType,
};

fn pg_column(table: &str, ordinal: i64, name: &str, type_name: &str) -> CatalogRow {
    catalog_row![
        "public", table, ordinal, name, None::<i64>, None::<i64>, type_name, None::<i64>,
        None::<i64>, None::<i64>, "NO", None::<&str>, None::<&str>, "NO"
    ]
}

fn shop_source(catalog: &PostgresCatalog) -> MemorySource<'_> {
    MemorySource::new(catalog)
        .with(
            ExtractionTarget::Tables,
            vec![
                catalog_row!["public", "customers", "r"],
                catalog_row!["public", "orders", "r"],
            ],
        )
        .with(
            ExtractionTarget::Columns,
            vec![
                pg_column("customers", 1, "id", "integer"),
                pg_column("customers", 2, "name", "text"),
                pg_column("customers", 3, "email", "text"),
                pg_column("orders", 1, "id", "bigint"),
                pg_column("orders", 2, "customer_id", "integer"),
            ],
        )
        .with(
            ExtractionTarget::ForeignKeys,
            vec![catalog_row![
                "public", "orders", "fk_orders_customers", 1, "customer_id", "public",
                "customers", "id", "CASCADE", "NO ACTION", "NO", "NO"
            ]],
        )
        .with(
            ExtractionTarget::KeyConstraints,
            vec![
                catalog_row!["public", "customers", "pk_customers", "PRIMARY KEY", 1, "id"],
                catalog_row!["public", "orders", "pk_orders", "PRIMARY KEY", 1, "id"],
            ],
        )
}

#[test]
fn test_columns_are_grouped_by_table() {
    let dialect = PostgresCatalog;
    let mut source = shop_source(&dialect);
    let catalog = CatalogExtractor::new(&dialect)
        .extract("shop", &mut source)
        .unwrap();

    let customers = catalog.table(&QualifiedName::new("public", "customers")).unwrap();
    let orders = catalog.table(&QualifiedName::new("public", "orders")).unwrap();
    assert_eq!(customers.columns().len(), 3);
    assert_eq!(orders.columns().len(), 2);
    assert_eq!(
        orders.column("id").unwrap().data_type,
        SqlValueType::new(SqlType::Int64)
    );
    assert!(!orders.column("id").unwrap().is_nullable);
    assert_eq!(source.executed, ExtractionTarget::ALL);
}

#[test]
fn test_keys_and_foreign_keys_are_assembled() {
    let dialect = PostgresCatalog;
    let catalog = CatalogExtractor::new(&dialect)
        .extract("shop", &mut shop_source(&dialect))
        .unwrap();
    let orders = catalog.table(&QualifiedName::new("public", "orders")).unwrap();

    // The last key group is flushed when the query ends.
    let key = orders.primary_key().unwrap();
    assert_eq!(key.name(), "pk_orders");
    assert!(matches!(&key.kind, ConstraintKind::PrimaryKey { columns } if columns == &["id"]));

    let (constraint, fk) = orders.foreign_keys().next().unwrap();
    assert_eq!(constraint.name(), "fk_orders_customers");
    assert_eq!(fk.referenced_table, QualifiedName::new("public", "customers"));
    assert_eq!(fk.on_delete, ReferentialAction::Cascade);
    assert_eq!(fk.on_update, ReferentialAction::NoAction);
    assert_eq!(fk.column_pairs().collect::<Vec<_>>(), [("customer_id", "id")]);
}

#[test]
fn test_async_path_matches_sync_path() {
    let dialect = PostgresCatalog;
    let extractor = CatalogExtractor::new(&dialect);
    let sync = extractor.extract("shop", &mut shop_source(&dialect)).unwrap();
    let mut source = shop_source(&dialect);
    let asynchronous =
        futures::executor::block_on(extractor.extract_async("shop", &mut source)).unwrap();
    assert_eq!(sync, asynchronous);
}

#[test]
fn test_revisited_owner_is_unsorted() {
    let dialect = PostgresCatalog;
    let mut source = MemorySource::new(&dialect)
        .with(
            ExtractionTarget::Tables,
            vec![
                catalog_row!["public", "a", "r"],
                catalog_row!["public", "b", "r"],
            ],
        )
        .with(
            ExtractionTarget::Columns,
            vec![
                pg_column("a", 1, "x", "integer"),
                pg_column("b", 1, "x", "integer"),
                pg_column("a", 2, "y", "integer"),
            ],
        );
    let err = CatalogExtractor::new(&dialect)
        .extract("shop", &mut source)
        .unwrap_err();
    assert!(
        matches!(&err, ExtractError::UnsortedRows { owner, .. } if owner == "public.a"),
        "{err:?}"
    );
}

#[test]
fn test_unknown_boolean_is_fatal() {
    let dialect = SqliteCatalog;
    let column = |nullable: &str| {
        catalog_row![
            "main", "t", 1, "flag", None::<i64>, None::<i64>, "INTEGER", None::<i64>,
            None::<i64>, None::<i64>, nullable, None::<&str>, None::<&str>, "0"
        ]
    };
    let tables = vec![catalog_row!["main", "t", "table"]];

    let mut good = MemorySource::new(&dialect)
        .with(ExtractionTarget::Tables, tables.clone())
        .with(ExtractionTarget::Columns, vec![column("1")]);
    let catalog = CatalogExtractor::new(&dialect).extract("db", &mut good).unwrap();
    let t = catalog.table(&QualifiedName::new("main", "t")).unwrap();
    assert!(t.column("flag").unwrap().is_nullable);

    let mut bad = MemorySource::new(&dialect)
        .with(ExtractionTarget::Tables, tables)
        .with(ExtractionTarget::Columns, vec![column("2")]);
    let err = CatalogExtractor::new(&dialect).extract("db", &mut bad).unwrap_err();
    assert!(
        matches!(&err, ExtractError::InvalidBooleanValue { value } if value == "2"),
        "{err:?}"
    );
}

#[test]
fn test_dangling_foreign_key_fails_validation() {
    let dialect = PostgresCatalog;
    let mut source = shop_source(&dialect).with(
        ExtractionTarget::ForeignKeys,
        vec![catalog_row![
            "public", "orders", "fk_orders_missing", 1, "customer_id", "public", "missing",
            "id", None::<&str>, None::<&str>, "NO", "NO"
        ]],
    );
    let err = CatalogExtractor::new(&dialect)
        .extract("shop", &mut source)
        .unwrap_err();
    assert!(matches!(err, ExtractError::Model(_)), "{err:?}");
}

#[test]
fn test_cancellation_stops_before_the_first_query() {
    let dialect = PostgresCatalog;
    let flag = CancellationFlag::new();
    flag.cancel();
    let mut source = shop_source(&dialect);
    let err = CatalogExtractor::new(&dialect)
        .with_cancellation(flag)
        .extract("shop", &mut source)
        .unwrap_err();
    assert!(matches!(err, ExtractError::Cancelled));
    assert!(source.executed.is_empty());
}

#[test]
fn test_schema_filter_skips_other_schemas() {
    let dialect = PostgresCatalog;
    let mut source = MemorySource::new(&dialect).with(
        ExtractionTarget::Tables,
        vec![
            catalog_row!["audit", "log", "r"],
            catalog_row!["public", "orders", "r"],
        ],
    );
    let catalog = CatalogExtractor::new(&dialect)
        .with_schemas(["audit"])
        .extract("shop", &mut source)
        .unwrap();
    assert_eq!(catalog.all_tables().count(), 1);
    assert!(catalog.schema("public").is_none());
}

#[test]
fn test_schema_filter_keeps_foreign_keys_into_other_schemas() {
    let dialect = PostgresCatalog;
    let mut source = MemorySource::new(&dialect)
        .with(
            ExtractionTarget::Tables,
            vec![
                catalog_row!["public", "users", "r"],
                catalog_row!["sales", "orders", "r"],
            ],
        )
        .with(
            ExtractionTarget::Columns,
            vec![
                pg_column("users", 1, "id", "integer"),
                catalog_row![
                    "sales", "orders", 1, "user_id", None::<i64>, None::<i64>, "integer",
                    None::<i64>, None::<i64>, None::<i64>, "NO", None::<&str>, None::<&str>, "NO"
                ],
            ],
        )
        .with(
            ExtractionTarget::ForeignKeys,
            vec![catalog_row![
                "sales", "orders", "fk_orders_user", 1, "user_id", "public", "users", "id",
                "NO ACTION", "NO ACTION", "NO", "NO"
            ]],
        );
    let catalog = CatalogExtractor::new(&dialect)
        .with_schemas(["sales"])
        .extract("shop", &mut source)
        .unwrap();

    assert_eq!(catalog.all_tables().count(), 1);
    let orders = catalog.table(&QualifiedName::new("sales", "orders")).unwrap();
    let (constraint, fk) = orders.foreign_keys().next().unwrap();
    assert_eq!(constraint.name(), "fk_orders_user");
    assert_eq!(fk.referenced_table, QualifiedName::new("public", "users"));

    // Without the filter the same target must exist.
    assert!(catalog.validate().is_err());
}
