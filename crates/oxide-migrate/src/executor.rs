//! Upgrade executor.
//!
//! This module plans an upgrade against a live SQLite database and applies
//! the resulting statements in one transaction.

use oxide_sql_core::compiler::CompiledCommand;
use oxide_sql_core::model::Catalog;
use oxide_sql_core::upgrade::UpgradePlan;
use oxide_sql_sqlite::SqliteRunner;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use crate::config::UpgradeConfig;
use crate::error::Result;

/// Brings a live database to a target catalog.
pub struct UpgradeExecutor {
    runner: SqliteRunner,
    config: UpgradeConfig,
    dry_run: bool,
}

impl UpgradeExecutor {
    /// Connects to the pool with the default configuration.
    pub async fn connect(pool: SqlitePool) -> Result<Self> {
        Ok(Self::new(SqliteRunner::connect(pool).await?))
    }

    /// Creates an executor on a runner.
    #[must_use]
    pub fn new(runner: SqliteRunner) -> Self {
        Self {
            runner,
            config: UpgradeConfig::default(),
            dry_run: false,
        }
    }

    /// Sets the mode, ignore rules and hints used for planning.
    #[must_use]
    pub fn config(mut self, config: UpgradeConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables dry-run mode (SQL is printed but not executed).
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Returns the runner.
    #[must_use]
    pub const fn runner(&self) -> &SqliteRunner {
        &self.runner
    }

    /// Reads the live `main` schema under the target's catalog name.
    pub async fn live_catalog(&self, target: &Catalog) -> Result<Catalog> {
        Ok(self.runner.extract(target.name()).await?)
    }

    /// Plans the changes that turn the live database into `target`.
    pub async fn plan(&self, target: &Catalog) -> Result<UpgradePlan> {
        let live = self.live_catalog(target).await?;
        let plan = self
            .config
            .planner(self.runner.dialect())
            .plan(&live, target)?;
        Ok(plan)
    }

    /// Compiles a plan for the connected engine.
    pub fn sql_for(&self, plan: &UpgradePlan) -> Result<Vec<CompiledCommand>> {
        Ok(plan.compile(self.runner.dialect())?)
    }

    /// Applies a plan and returns the number of statements run.
    pub async fn apply(&self, plan: &UpgradePlan) -> Result<usize> {
        let commands = self.sql_for(plan)?;
        if commands.is_empty() {
            info!("Database is up to date");
            return Ok(0);
        }

        if self.dry_run {
            for command in &commands {
                debug!(sql = %command.text, "Executing SQL");
                println!("{};", command.text);
            }
            return Ok(commands.len());
        }

        info!(statements = commands.len(), "Applying upgrade");
        self.runner.execute_all(&commands).await?;
        info!("Upgrade applied successfully");
        Ok(commands.len())
    }

    /// Plans and applies in one step.
    pub async fn upgrade(&self, target: &Catalog) -> Result<usize> {
        let plan = self.plan(target).await?;
        self.apply(&plan).await
    }
}
