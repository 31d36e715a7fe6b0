//! Bot configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable holding the Telegram bot token.
pub const TOKEN_VAR: &str = "API_TOKEN";

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,xo_bot=debug,xo_engine=info";

/// Settings read from a TOML file; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// SQLite database file; sessions stay in memory when absent.
    database_path: Option<String>,

    /// Seconds Telegram may cache a rejection notice.
    answer_cache_time: u32,

    /// Title of the inline article.
    article_title: String,

    /// Description of the inline article.
    article_description: String,

    /// `tracing` filter directive.
    log_filter: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            answer_cache_time: 5,
            article_title: "Tic Tac Toe".to_string(),
            article_description: "Tic Tac Toe Game".to_string(),
            log_filter: None,
        }
    }
}

impl BotConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(database = ?config.database_path, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Replaces the database path, e.g. from a command-line flag.
    pub fn with_database_path(mut self, path: Option<String>) -> Self {
        if path.is_some() {
            self.database_path = path;
        }
        self
    }

    /// Log filter to use when `RUST_LOG` is unset.
    pub fn effective_log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

/// Reads the bot token from the environment.
///
/// # Errors
///
/// Returns [`ConfigError`] if [`TOKEN_VAR`] is unset or empty.
#[instrument]
pub fn bot_token() -> Result<String, ConfigError> {
    match std::env::var(TOKEN_VAR) {
        Ok(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(ConfigError::new(format!(
            "{TOKEN_VAR} environment variable not set"
        ))),
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
