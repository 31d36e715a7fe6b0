//! Process-local session store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use xo_engine::{GameSession, SessionId, SessionStatus};

use super::{GameStore, Opened, StoreError, StoreErrorKind};

/// A stored session and the context it was opened under.
#[derive(Debug)]
struct Entry {
    context: String,
    session: Mutex<GameSession>,
}

/// Sessions kept in memory, each behind its own lock.
///
/// The map locks are held only long enough to find, insert or remove an
/// entry, so moves in different sessions never wait on each other. Finished
/// sessions are evicted on commit; later presses find nothing.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sessions: Mutex<HashMap<SessionId, Arc<Entry>>>,
    contexts: Mutex<HashMap<String, SessionId>>,
    last_id: AtomicI64,
}

#[track_caller]
fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    match mutex.lock() {
        Ok(guard) => Ok(guard),
        Err(_) => Err(StoreError::new(StoreErrorKind::Poisoned)),
    }
}

impl InMemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory session store");
        Self::default()
    }

    /// Number of stored sessions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the map lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.sessions)?.len())
    }

    /// Returns true when no session is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the map lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn entry(&self, id: SessionId) -> Result<Arc<Entry>, StoreError> {
        lock(&self.sessions)?
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    /// Drops a finished session and its context binding.
    fn evict(&self, id: SessionId, context: &str) -> Result<(), StoreError> {
        lock(&self.sessions)?.remove(&id);
        lock(&self.contexts)?.remove(context);
        debug!(session_id = %id, "Finished session evicted");
        Ok(())
    }
}

impl GameStore for InMemoryStore {
    #[instrument(skip(self, session))]
    fn create(&self, context: &str, session: GameSession) -> Result<Opened, StoreError> {
        // Holding the context map across the insert makes open-once atomic.
        let mut contexts = lock(&self.contexts)?;
        if let Some(id) = contexts.get(context) {
            debug!(session_id = %id, "Context already has a session");
            return Ok(Opened::Existing(*id));
        }

        let id = SessionId(self.last_id.fetch_add(1, Ordering::Relaxed) + 1);
        let entry = Entry {
            context: context.to_string(),
            session: Mutex::new(session),
        };
        lock(&self.sessions)?.insert(id, Arc::new(entry));
        contexts.insert(context.to_string(), id);
        info!(session_id = %id, "Session stored");
        Ok(Opened::Created(id))
    }

    #[instrument(skip(self))]
    fn load(&self, id: SessionId) -> Result<GameSession, StoreError> {
        let entry = self.entry(id)?;
        let session = lock(&entry.session)?.clone();
        Ok(session)
    }

    #[instrument(skip(self, f))]
    fn update<T, E, F>(&self, id: SessionId, f: F) -> Result<Result<T, E>, StoreError>
    where
        F: FnOnce(&mut GameSession) -> Result<T, E>,
    {
        let entry = self.entry(id)?;
        let mut current = lock(&entry.session)?;

        let mut draft = current.clone();
        let result = f(&mut draft);
        if result.is_err() {
            debug!(session_id = %id, "Update rejected, nothing committed");
            return Ok(result);
        }

        *current = draft;
        debug!(session_id = %id, status = %current.status(), "Session committed");
        if current.status() == SessionStatus::Finished {
            self.evict(id, &entry.context)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xo_engine::{GameError, Participant, Position, Sign, UserId};

    fn opened() -> GameSession {
        GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross)
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let store = InMemoryStore::new();
        assert_eq!(store.create("m1", opened()).unwrap(), Opened::Created(SessionId(1)));
        assert_eq!(store.create("m2", opened()).unwrap(), Opened::Created(SessionId(2)));
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_context_opens_once() {
        let store = InMemoryStore::new();
        let first = store.create("m1", opened()).unwrap();
        let second = store.create("m1", opened()).unwrap();
        assert_eq!(second, Opened::Existing(first.id()));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.load(SessionId(7)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_failed_update_commits_nothing() {
        let store = InMemoryStore::new();
        let id = store.create("m1", opened()).unwrap().id();

        let result = store
            .update(id, |session| {
                session.claim_sign(Participant::new(UserId(1), "Alice".into()), Sign::Circle)
            })
            .unwrap();
        assert_eq!(result, Err(GameError::AlreadyClaimed));
        assert_eq!(store.load(id).unwrap(), opened());
    }

    #[test]
    fn test_finished_session_is_evicted() {
        let store = InMemoryStore::new();
        let id = store.create("m1", opened()).unwrap().id();
        store
            .update(id, |s| s.claim_sign(Participant::new(UserId(2), "Bob".into()), Sign::Circle))
            .unwrap()
            .unwrap();

        let moves = [
            (1, Position::TopLeft),
            (2, Position::Center),
            (1, Position::TopCenter),
            (2, Position::MiddleLeft),
            (1, Position::TopRight),
        ];
        for (user, position) in moves {
            store
                .update(id, |s| s.attempt_move(UserId(user), position))
                .unwrap()
                .unwrap();
        }

        assert!(store.is_empty().unwrap());
        assert!(store.load(id).unwrap_err().is_not_found());
        // The message context is free again.
        assert!(matches!(store.create("m1", opened()).unwrap(), Opened::Created(_)));
    }
}
