mod cli;
mod observability;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use csi_api::{ImportOperation, OperationHandler};
use csi_db_postgres::{schema, PgConfig, PgTerminologyStore};
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::Postgres;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    if let Err(err) = run(cli).await {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let database_url = cli
        .database_url
        .context("--database-url or CSI_DATABASE_URL must be set")?;

    let config = PgConfig::new(database_url.as_str());
    let pool = PoolOptions::<Postgres>::new()
        .max_connections(config.pool_size)
        .connect(&config.url)
        .await
        .context("failed to connect to PostgreSQL")?;

    match cli.command {
        Commands::Migrate => {
            schema::run_migrations(&pool)
                .await
                .context("failed to run schema migrations")?;
            println!("{}", "Schema is up to date.".green());
        }
        Commands::Import(args) => {
            let body = std::fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read batch file {}", args.file))?;
            let params: serde_json::Value = serde_json::from_str(&body)
                .with_context(|| format!("failed to parse {} as JSON", args.file))?;

            let store = Box::new(PgTerminologyStore::new(pool.clone()));
            let operation = ImportOperation::new(pool, store, config);

            let result = operation
                .handle_system(&params, args.privileged)
                .await
                .map_err(|err| anyhow::anyhow!("{err}"))?;

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
