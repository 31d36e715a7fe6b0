//! Session persistence.
//!
//! Handlers never hold a session across requests; they go through a
//! [`GameStore`] whose [`update`](GameStore::update) loads, mutates and commits
//! one session at a time. Updates to the same session are linearized and a
//! closure that returns `Err` commits nothing.
//!
//! Sessions are opened under a request context (the inline message the game
//! lives in), so a repeated first pick finds the session the earlier one made.

mod error;
mod memory;
mod sqlite;

pub use error::{StoreError, StoreErrorKind};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use tracing::instrument;
use xo_engine::{GameSession, SessionId};

/// Result of opening a session under a request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opened {
    /// The session was stored under a new id.
    Created(SessionId),
    /// The context already had this session; nothing was stored.
    Existing(SessionId),
}

impl Opened {
    /// Id of the session bound to the context.
    pub fn id(self) -> SessionId {
        match self {
            Opened::Created(id) | Opened::Existing(id) => id,
        }
    }
}

/// Storage for game sessions.
pub trait GameStore: Send + Sync {
    /// Stores a freshly opened session under `context`, unless the context
    /// already has one.
    fn create(&self, context: &str, session: GameSession) -> Result<Opened, StoreError>;

    /// Returns a snapshot of a session.
    fn load(&self, id: SessionId) -> Result<GameSession, StoreError>;

    /// Runs `f` against the current session and commits only if it returns `Ok`.
    ///
    /// The outer `Result` reports storage failures (including an unknown id);
    /// the inner one is whatever `f` decided.
    fn update<T, E, F>(&self, id: SessionId, f: F) -> Result<Result<T, E>, StoreError>
    where
        F: FnOnce(&mut GameSession) -> Result<T, E>;
}

/// Store backend chosen at startup.
#[derive(Debug)]
pub enum AnyStore {
    /// Process-local sessions, lost on restart.
    Memory(InMemoryStore),
    /// SQLite-backed sessions.
    Sqlite(SqliteStore),
}

impl AnyStore {
    /// Picks SQLite when a database path is configured, memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the SQLite schema cannot be migrated.
    #[instrument]
    pub fn open(database_path: Option<&str>) -> Result<Self, StoreError> {
        match database_path {
            Some(path) => {
                let store = SqliteStore::new(path.to_string());
                store.migrate()?;
                Ok(Self::Sqlite(store))
            }
            None => Ok(Self::Memory(InMemoryStore::new())),
        }
    }
}

impl GameStore for AnyStore {
    fn create(&self, context: &str, session: GameSession) -> Result<Opened, StoreError> {
        match self {
            Self::Memory(store) => store.create(context, session),
            Self::Sqlite(store) => store.create(context, session),
        }
    }

    fn load(&self, id: SessionId) -> Result<GameSession, StoreError> {
        match self {
            Self::Memory(store) => store.load(id),
            Self::Sqlite(store) => store.load(id),
        }
    }

    fn update<T, E, F>(&self, id: SessionId, f: F) -> Result<Result<T, E>, StoreError>
    where
        F: FnOnce(&mut GameSession) -> Result<T, E>,
    {
        match self {
            Self::Memory(store) => store.update(id, f),
            Self::Sqlite(store) => store.update(id, f),
        }
    }
}
