//! xo_bot - Unified CLI
//!
//! Runs the inline tic-tac-toe bot or prepares its database.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;
use xo_bot::cli::{Cli, Command};
use xo_bot::telegram::{self, BotState};
use xo_bot::{AnyStore, BotConfig, Router, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { config, database } => {
            let config = match config {
                Some(path) => BotConfig::from_file(path)?,
                None => BotConfig::default(),
            }
            .with_database_path(database);
            init_tracing(config.effective_log_filter());
            run_bot(config).await
        }
        Command::Migrate { database } => {
            init_tracing(xo_bot::DEFAULT_LOG_FILTER);
            migrate(database)
        }
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(fallback: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

/// Run the bot until Ctrl-C
#[instrument(skip_all)]
async fn run_bot(config: BotConfig) -> Result<()> {
    let token = xo_bot::bot_token()?;

    let store = AnyStore::open(config.database_path().as_deref())?;
    match &store {
        AnyStore::Memory(_) => info!("Sessions kept in memory; they are lost on restart"),
        AnyStore::Sqlite(_) => info!(path = ?config.database_path(), "Sessions stored in SQLite"),
    }

    let router = Router::new(store);
    telegram::run(token, BotState::new(router, config)).await
}

/// Apply pending migrations and exit
#[instrument]
fn migrate(database: String) -> Result<()> {
    info!("Migrating database");
    SqliteStore::new(database).migrate()?;
    info!("Database ready");
    Ok(())
}
