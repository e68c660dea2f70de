//! Invoicing schema upgrade example
//!
//! Plans the move from a first invoicing schema to a second one and prints
//! the resulting statements for PostgreSQL and SQLite.
//!
//! Run with: cargo run --example invoicing

use std::error::Error;

use oxide_sql_core::dialect::{Dialect, PostgresDialect, SqliteDialect};
use oxide_sql_core::model::{
    Catalog, Constraint, ForeignKey, QualifiedName, ReferentialAction, Result as ModelResult,
    SqlType, SqlValueType, Table, TableColumn,
};
use oxide_sql_core::upgrade::{UpgradeHint, UpgradeMode, UpgradePlan, UpgradePlanner};

// =============================================================================
// SCHEMA DEFINITIONS
// =============================================================================

fn clients() -> ModelResult<Table> {
    let mut clients = Table::new("clients");
    clients.add_column(TableColumn::new("id", SqlType::Int64).not_null())?;
    clients.create_column("name", SqlValueType::varchar(120))?;
    clients.create_primary_key("pk_clients", &["id"])?;
    Ok(clients)
}

fn invoices() -> ModelResult<Table> {
    let mut invoices = Table::new("invoices");
    invoices.add_column(TableColumn::new("id", SqlType::Int64).not_null())?;
    invoices.create_column("client_id", SqlType::Int64)?;
    invoices.create_column("amount", SqlValueType::decimal(10, 2))?;
    invoices.create_primary_key("pk_invoices", &["id"])?;
    invoices.add_constraint(Constraint::foreign_key(
        "fk_invoices_clients",
        ForeignKey::new(QualifiedName::new("billing", "clients"))
            .with_columns("client_id", "id")
            .on_delete(ReferentialAction::Cascade),
    ))?;
    Ok(invoices)
}

/// Version 1: clients only.
fn version_one() -> ModelResult<Catalog> {
    let mut catalog = Catalog::new("invoicing");
    catalog.create_schema("billing")?.add_table(clients()?)?;
    Ok(catalog)
}

/// Version 2: invoices and a renamed client column.
fn version_two() -> ModelResult<Catalog> {
    let mut catalog = Catalog::new("invoicing");
    let billing = catalog.create_schema("billing")?;
    billing.add_table(clients()?)?;
    billing.add_table(invoices()?)?;
    catalog.rename_column(&QualifiedName::new("billing", "clients"), "name", "display_name")?;
    Ok(catalog)
}

// =============================================================================
// PLANNING
// =============================================================================

fn print_plan(plan: &UpgradePlan, dialect: &dyn Dialect) -> Result<(), Box<dyn Error>> {
    println!("-- {}", dialect.name());
    for (action, command) in plan.actions().iter().zip(plan.compile(dialect)?) {
        println!("{:<16} {};", format!("{:?}", action.stage), command.text);
    }
    println!();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let (old, new) = (version_one()?, version_two()?);
    let hint = UpgradeHint::rename("billing.clients.name", "billing.clients.display_name")?;

    let postgres = UpgradePlanner::new()
        .mode(UpgradeMode::PerformSafely)
        .hint(hint.clone())
        .plan(&old, &new)?;
    print_plan(&postgres, &PostgresDialect::default())?;

    let sqlite = UpgradePlanner::new()
        .hint(hint)
        .inline_foreign_keys(true)
        .plan(&old, &new)?;
    print_plan(&sqlite, &SqliteDialect::default())?;
    Ok(())
}
