//! Comparison and upgrade planning across whole catalogs.

mod common;

use common::{customers, orders, shop};
use oxide_sql_core::ast::SqlDdl;
use oxide_sql_core::dialect::{DialectKind, PostgresDialect, SqliteDialect};
use oxide_sql_core::model::{Named, QualifiedName, SqlType, SqlValueType, Table, TableColumn};
use oxide_sql_core::upgrade::{
    compare, IgnoreRule, UnsafeReason, UpgradeError, UpgradeHint, UpgradeMode, UpgradePlanner,
    UpgradeStage,
};

fn planner() -> UpgradePlanner {
    UpgradePlanner::new().mode(UpgradeMode::Perform)
}

fn table_position(statements: &[&SqlDdl], wanted: &str) -> usize {
    statements
        .iter()
        .position(|s| match s {
            SqlDdl::CreateTable { table, .. } => table.name() == wanted,
            SqlDdl::DropTable { table, .. } => table.name == wanted,
            _ => false,
        })
        .unwrap_or_else(|| panic!("no statement for {wanted}"))
}

#[test]
fn test_self_diff_is_empty() {
    let catalog = shop(vec![customers(), orders()]);
    assert!(compare(&catalog, &catalog, &[]).unwrap().is_empty());
    assert!(planner().plan(&catalog, &catalog).unwrap().is_empty());
}

#[test]
fn test_create_order_follows_references() {
    let plan = planner()
        .plan(&shop(Vec::new()), &shop(vec![orders(), customers()]))
        .unwrap();
    let statements: Vec<_> = plan.statements().collect();
    assert!(table_position(&statements, "customers") < table_position(&statements, "orders"));

    let commands = plan.compile(&PostgresDialect::default()).unwrap();
    let texts: Vec<&str> = commands.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts.len(), 3);
    assert!(texts[0].starts_with(r#"CREATE TABLE "main"."customers""#));
    assert!(texts[1].starts_with(r#"CREATE TABLE "main"."orders""#));
    assert!(!texts[1].contains("FOREIGN KEY"));
    assert!(texts[2].starts_with(r#"ALTER TABLE "main"."orders" ADD CONSTRAINT"#));
}

#[test]
fn test_drop_order_follows_references() {
    let plan = planner()
        .plan(&shop(vec![customers(), orders()]), &shop(Vec::new()))
        .unwrap();
    let statements: Vec<_> = plan.statements().collect();
    assert!(table_position(&statements, "orders") < table_position(&statements, "customers"));
}

#[test]
fn test_sqlite_plan_keeps_foreign_keys_inline() {
    let dialect = SqliteDialect::new(DialectKind::Sqlite.default_version());
    let plan = planner()
        .inline_foreign_keys(true)
        .plan(&shop(Vec::new()), &shop(vec![orders(), customers()]))
        .unwrap();
    let commands = plan.compile(&dialect).unwrap();
    assert_eq!(commands.len(), 2);
    assert!(commands[1].text.contains("FOREIGN KEY"));
}

#[test]
fn test_ignored_table_never_appears() {
    let mut old = shop(vec![customers()]);
    let mut audit = Table::new("audit_log");
    audit.create_column("id", SqlType::Int32).unwrap();
    old.schema_mut("main").unwrap().add_table(audit.clone()).unwrap();

    let mut new = shop(vec![customers()]);
    audit.create_column("extra", SqlType::Int32).unwrap();
    new.schema_mut("main").unwrap().add_table(audit).unwrap();

    let plan = UpgradePlanner::new()
        .ignore(IgnoreRule::table("AUDIT_*"))
        .plan(&old, &new)
        .unwrap();
    assert!(plan.is_empty());
    assert!(plan.diff().is_empty());
}

#[test]
fn test_safe_mode_collects_all_issues() {
    let old = shop(vec![customers(), orders()]);
    let mut new = shop(vec![customers()]);
    let table = new
        .table_mut(&QualifiedName::new("main", "customers"))
        .unwrap();
    table.column_mut("name").unwrap().data_type = SqlValueType::varchar(20);
    table
        .add_column(TableColumn::new("code", SqlType::Int32).not_null())
        .unwrap();

    let err = UpgradePlanner::new().plan(&old, &new).unwrap_err();
    let UpgradeError::UnsafeUpgrade(report) = err else {
        panic!("expected a blocked upgrade, got {err:?}");
    };
    let reasons: Vec<&UnsafeReason> = report.issues().iter().map(|i| &i.reason).collect();
    assert_eq!(reasons.len(), 3);
    assert!(reasons.contains(&&UnsafeReason::DropTable));
    assert!(reasons.contains(&&UnsafeReason::NotNullWithoutDefault));
    assert!(reasons
        .iter()
        .any(|r| matches!(r, UnsafeReason::NarrowingType { .. })));
}

#[test]
fn test_hints_from_json_rename_a_column() {
    let old = shop(vec![customers()]);
    let mut new = shop(vec![customers()]);
    new.rename_column(&QualifiedName::new("main", "customers"), "name", "full_name")
        .unwrap();

    let hints: Vec<UpgradeHint> = serde_json::from_str(
        r#"[{"kind": "rename", "from": "main.customers.name", "to": "main.customers.full_name"}]"#,
    )
    .unwrap();
    let plan = UpgradePlanner::new().hints(hints).plan(&old, &new).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.actions()[0].stage, UpgradeStage::RenameColumns);

    let text = &plan.compile(&PostgresDialect::default()).unwrap()[0].text;
    assert_eq!(
        text,
        r#"ALTER TABLE "main"."customers" RENAME COLUMN "name" TO "full_name""#
    );
}

#[test]
fn test_hint_for_missing_table_is_rejected() {
    let catalog = shop(vec![customers()]);
    let err = UpgradePlanner::new()
        .hint(UpgradeHint::rename("main.clients", "main.customers").unwrap())
        .plan(&catalog, &catalog)
        .unwrap_err();
    assert!(matches!(err, UpgradeError::InvalidHint(_)));
}

#[test]
fn test_unsupported_action_fails_to_compile() {
    let old = shop(vec![customers()]);
    let new = shop(vec![customers(), orders()]);
    let dialect = SqliteDialect::new(DialectKind::Sqlite.default_version());
    let plan = planner().plan(&old, &new).unwrap();
    let err = plan.compile(&dialect).unwrap_err();
    assert!(matches!(err, UpgradeError::Compile(_)));
}
