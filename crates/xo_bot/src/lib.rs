//! xo_bot library - inline tic-tac-toe for Telegram
//!
//! # Architecture
//!
//! - **Handler**: dispatch table from button action to game operation
//! - **Store**: session persistence (in memory or SQLite via diesel)
//! - **Config**: TOML settings plus the bot token from the environment
//! - **Telegram**: thin teloxide transport around the handler
//!
//! # Example
//!
//! ```
//! use xo_bot::{InMemoryStore, Reply, Router};
//! use xo_engine::protocol::{Action, SignPick};
//! use xo_engine::{Participant, Sign, UserId};
//!
//! let router = Router::new(InMemoryStore::new());
//! let alice = Participant::new(UserId(1), "Alice".to_string());
//! let pick = Action::PickSign(SignPick { initiator: UserId(1), sign: Sign::Cross, session: None });
//!
//! let reply = router.dispatch("inline-message-1", &alice, &pick)?;
//! assert!(matches!(reply, Reply::Update { .. }));
//! # Ok::<(), xo_bot::HandlerError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod handler;
mod store;

pub mod cli;
pub mod telegram;

// Crate-level exports - Configuration
pub use config::{BotConfig, ConfigError, DEFAULT_LOG_FILTER, TOKEN_VAR, bot_token};

// Crate-level exports - Handler
pub use handler::{HandlerError, Reply, Router, SESSION_NOT_FOUND, TRY_AGAIN};

// Crate-level exports - Persistence
pub use store::{
    AnyStore, GameStore, InMemoryStore, Opened, SqliteStore, StoreError, StoreErrorKind,
};
