//! oxide-migrate CLI
//!
//! Command-line tool for upgrading a database to a target schema.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_migrate::prelude::*;
use oxide_sql_core::dialect::Dialect;

/// Schema upgrades driven by catalog comparison.
#[derive(Parser)]
#[command(name = "oxide-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Upgrade configuration (JSON).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the live schema as JSON.
    Extract {
        /// Catalog name written to the dump.
        #[arg(short, long, default_value = "main")]
        name: String,

        /// Output file (stdout if not specified).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show SQL that upgrades the database to a target schema.
    Plan {
        /// Target schema (JSON).
        #[arg(short, long)]
        target: PathBuf,
    },

    /// Upgrade the database to a target schema.
    Upgrade {
        /// Target schema (JSON).
        #[arg(short, long)]
        target: PathBuf,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => UpgradeConfig::load(path)?,
        None => UpgradeConfig::default(),
    };

    // Connect to database
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&cli.database)
        .await?;

    match cli.command {
        Commands::Extract { name, output } => {
            let executor = UpgradeExecutor::connect(pool).await?;
            let catalog = executor.runner().extract(&name).await?;
            let json = serde_json::to_string_pretty(&catalog)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    info!("Wrote schema to {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Commands::Plan { target } => {
            let target = load_catalog(&target)?;
            let printed = config.dialect.map(|kind| kind.create(None));
            let executor = UpgradeExecutor::connect(pool).await?.config(config);
            let plan = executor.plan(&target).await?;

            for issue in plan.report().issues() {
                info!(path = %issue.path, "Unsafe: {}", issue.reason);
            }
            let dialect: &dyn Dialect = match &printed {
                Some(dialect) => &**dialect,
                None => executor.runner().dialect(),
            };
            let commands = plan.compile(dialect)?;
            if commands.is_empty() {
                info!("No changes detected.");
            }
            for command in commands {
                println!("{};", command.text);
            }
        }

        Commands::Upgrade { target, dry_run } => {
            let target = load_catalog(&target)?;
            let executor = UpgradeExecutor::connect(pool)
                .await?
                .config(config)
                .dry_run(dry_run);

            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }
            let count = executor.upgrade(&target).await?;
            info!(statements = count, "Upgrade finished");
        }
    }

    Ok(())
}
