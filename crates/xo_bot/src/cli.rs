//! Command-line interface for xo_bot.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// xo_bot - inline tic-tac-toe for Telegram chats
#[derive(Parser, Debug)]
#[command(name = "xo_bot")]
#[command(about = "Inline tic-tac-toe bot for Telegram", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bot (long polling)
    Run {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// SQLite database file; overrides the config file
        #[arg(long)]
        database: Option<String>,
    },

    /// Create or upgrade the SQLite schema and exit
    Migrate {
        /// Path to the database file (created if it doesn't exist)
        #[arg(long, default_value = "xo_bot.db")]
        database: String,
    },
}
