//! Store error types.

use derive_more::{Display, Error};
use tracing::instrument;
use xo_engine::SessionId;

/// What went wrong in a store.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum StoreErrorKind {
    /// No session with this id.
    #[display("Session {_0} not found")]
    SessionNotFound(SessionId),

    /// A session lock was poisoned by a panicking writer.
    #[display("Session lock poisoned")]
    Poisoned,

    /// Stored rows no longer describe a valid session.
    #[display("Corrupt record: {_0}")]
    Corrupt(String),

    /// The database failed.
    #[display("Backend failure: {_0}")]
    Backend(String),
}

/// Store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error: {} at {}:{}", kind, file, line)]
pub struct StoreError {
    /// Error kind.
    pub kind: StoreErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: StoreErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Missing session.
    #[track_caller]
    pub fn not_found(id: SessionId) -> Self {
        Self::new(StoreErrorKind::SessionNotFound(id))
    }

    /// Database failure with a message.
    #[track_caller]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Backend(message.into()))
    }

    /// Returns true when the session does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, StoreErrorKind::SessionNotFound(_))
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::backend(format!("Diesel error: {}", err))
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::backend(format!("Connection error: {}", err))
    }
}
