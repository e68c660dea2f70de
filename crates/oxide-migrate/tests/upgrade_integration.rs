//! End-to-end upgrades from JSON files against in-memory SQLite.

mod common;

use common::{blog, create_test_pool, write_json};
use oxide_migrate::prelude::*;
use oxide_sql_core::dialect::{PostgresDialect, SqliteDialect};
use oxide_sql_core::model::{Catalog, ModelError, QualifiedName, SqlType};
use oxide_sql_core::upgrade::{compare, UpgradeError};

#[tokio::test]
async fn test_target_file_round_trip() {
    let target = write_json(&serde_json::to_string(&blog()).unwrap());
    let target = load_catalog(target.path()).unwrap();
    assert_eq!(target, blog());

    let executor = UpgradeExecutor::connect(create_test_pool().await)
        .await
        .unwrap();
    assert_eq!(executor.upgrade(&target).await.unwrap(), 2);

    let live = executor.live_catalog(&target).await.unwrap();
    assert!(compare(&live, &target, &[]).unwrap().is_empty());
}

#[test]
fn test_dangling_target_is_rejected() {
    let mut catalog = blog();
    catalog.schema_mut("main").unwrap().remove_table("authors");
    let file = write_json(&serde_json::to_string(&catalog).unwrap());
    let err = load_catalog(file.path()).unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Model(ModelError::DanglingReference { .. })
    ));
}

#[test]
fn test_foreign_keys_follow_dialect_capabilities() {
    let config = UpgradeConfig::default();
    let mut empty = Catalog::new("blog");
    empty.create_schema("main").unwrap();

    // SQLite cannot add a constraint later, so the key stays in CREATE TABLE.
    let sqlite = config
        .planner(&SqliteDialect::default())
        .plan(&empty, &blog())
        .unwrap();
    let postgres = config
        .planner(&PostgresDialect::default())
        .plan(&empty, &blog())
        .unwrap();
    assert_eq!(sqlite.len(), 2);
    assert_eq!(postgres.len(), 3);
}

#[tokio::test]
async fn test_config_file_drives_rename() {
    let executor = UpgradeExecutor::connect(create_test_pool().await)
        .await
        .unwrap();
    executor.upgrade(&blog()).await.unwrap();

    let mut target = blog();
    target
        .rename_column(&QualifiedName::new("main", "posts"), "body", "content")
        .unwrap();
    target
        .table_mut(&QualifiedName::new("main", "authors"))
        .unwrap()
        .create_column("bio", SqlType::VarCharMax)
        .unwrap();

    let config = write_json(
        r#"{ "hints": [{ "kind": "rename", "from": "main.posts.body", "to": "main.posts.content" }] }"#,
    );
    let executor = executor.config(UpgradeConfig::load(config.path()).unwrap());
    let plan = executor.plan(&target).await.unwrap();
    let sql: Vec<String> = executor
        .sql_for(&plan)
        .unwrap()
        .into_iter()
        .map(|command| command.text)
        .collect();
    assert_eq!(
        sql,
        vec![
            r#"ALTER TABLE "posts" RENAME COLUMN "body" TO "content""#.to_string(),
            r#"ALTER TABLE "authors" ADD COLUMN "bio" TEXT"#.to_string(),
        ]
    );
    executor.apply(&plan).await.unwrap();

    let live = executor.live_catalog(&target).await.unwrap();
    assert!(compare(&live, &target, &[]).unwrap().is_empty());
}

#[tokio::test]
async fn test_column_drop_is_blocked_without_hint() {
    let executor = UpgradeExecutor::connect(create_test_pool().await)
        .await
        .unwrap();
    executor.upgrade(&blog()).await.unwrap();

    let mut target = blog();
    target
        .table_mut(&QualifiedName::new("main", "posts"))
        .unwrap()
        .remove_column("body");
    let err = executor.upgrade(&target).await.unwrap_err();
    let MigrateError::Upgrade(UpgradeError::UnsafeUpgrade(report)) = err else {
        panic!("expected an unsafe upgrade, got {err}");
    };
    assert_eq!(report.issues().len(), 1);
    assert_eq!(report.issues()[0].path.to_string(), "main.posts.body");
}
