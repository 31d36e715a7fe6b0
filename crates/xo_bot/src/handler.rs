//! Move protocol handler.
//!
//! Each callback action is routed through a dispatch table built once at
//! startup. Handlers load and mutate sessions only through a [`GameStore`]
//! and answer with a transport-neutral [`Reply`].

use derive_more::{Display, Error, From};
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use xo_engine::presentation::{
    Keyboard, board_keyboard, final_text, session_caption, sign_keyboard,
};
use xo_engine::protocol::{Action, ActionKind, CellPick, ProtocolError, SignPick};
use xo_engine::{GameError, GameSession, MoveOutcome, Participant, Position};

use crate::store::{GameStore, Opened, StoreError};

/// Notice shown when a button points at a session the store no longer has.
pub const SESSION_NOT_FOUND: &str = "This game no longer exists";

/// Notice shown when a press could not be processed at all.
pub const TRY_AGAIN: &str = "Something went wrong. Please try again";

/// What the transport should do with the message that carried the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Replace text and keyboard.
    Update {
        /// New message text.
        text: String,
        /// New keyboard.
        keyboard: Keyboard,
    },
    /// Replace only the keyboard.
    UpdateKeyboard {
        /// New keyboard.
        keyboard: Keyboard,
    },
    /// Replace the text and drop the keyboard; the game is over.
    Finish {
        /// End caption and final board.
        text: String,
    },
    /// Leave the message alone and show the presser a notice.
    Reject {
        /// Notice text.
        notice: String,
    },
}

impl Reply {
    fn reject(notice: impl ToString) -> Self {
        Self::Reject {
            notice: notice.to_string(),
        }
    }

    /// Splits a dispatch result into the reply to show and the failure to
    /// report, so a failed press is still answered with [`TRY_AGAIN`].
    pub fn or_try_again(result: Result<Reply, HandlerError>) -> (Reply, Option<HandlerError>) {
        match result {
            Ok(reply) => (reply, None),
            Err(err) => (Self::reject(TRY_AGAIN), Some(err)),
        }
    }
}

/// Failures the presser cannot fix by pressing another button.
#[derive(Debug, Display, From, Error)]
pub enum HandlerError {
    /// Storage failed.
    #[display("{_0}")]
    Store(StoreError),
    /// Action could not be routed.
    #[display("{_0}")]
    Protocol(ProtocolError),
}

type Route<S> = fn(&Router<S>, &str, &Participant, &Action) -> Result<Reply, HandlerError>;

/// Dispatch table from action kind to handler.
#[derive(Debug)]
pub struct Router<S> {
    store: S,
    routes: HashMap<ActionKind, Route<S>>,
}

impl<S: GameStore> Router<S> {
    /// Builds the table over `store`.
    #[instrument(skip(store))]
    pub fn new(store: S) -> Self {
        let mut routes: HashMap<ActionKind, Route<S>> = HashMap::new();
        routes.insert(ActionKind::PickSign, pick_sign::<S>);
        routes.insert(ActionKind::PickCell, pick_cell::<S>);
        info!(routes = routes.len(), "Router ready");
        Self { store, routes }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handles one pressed button on the message identified by `context`.
    ///
    /// Game rule violations come back as [`Reply::Reject`]; only storage and
    /// routing failures are errors.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] if the store fails or the action has no route.
    #[instrument(skip(self, participant), fields(user_id = %participant.id(), kind = %action.kind()))]
    pub fn dispatch(
        &self,
        context: &str,
        participant: &Participant,
        action: &Action,
    ) -> Result<Reply, HandlerError> {
        let route = self
            .routes
            .get(&action.kind())
            .ok_or(ProtocolError::Unrouted(action.kind()))?;
        route(self, context, participant, action)
    }
}

/// Turns a store round-trip into a reply.
fn settle(outcome: Result<Result<Reply, GameError>, StoreError>) -> Result<Reply, HandlerError> {
    match outcome {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(rejection)) => {
            info!(%rejection, "Action rejected");
            Ok(Reply::reject(rejection))
        }
        Err(err) if err.is_not_found() => {
            info!(%err, "Action for unknown session");
            Ok(Reply::reject(SESSION_NOT_FOUND))
        }
        Err(err) => Err(err.into()),
    }
}

/// "Pick sign": the first pick opens a session, the second starts the game.
///
/// A repeated first pick on the same message resolves to the session the
/// earlier one opened and is judged as a claim on it.
#[instrument(skip_all, fields(user_id = %participant.id()))]
fn pick_sign<S: GameStore>(
    router: &Router<S>,
    context: &str,
    participant: &Participant,
    action: &Action,
) -> Result<Reply, HandlerError> {
    let Action::PickSign(SignPick {
        initiator,
        sign,
        session,
    }) = *action
    else {
        return Err(ProtocolError::Misrouted(action.kind()).into());
    };

    let id = match session {
        Some(id) => id,
        None => {
            if *participant.id() != initiator {
                debug!(%initiator, "First pick by someone other than the initiator");
                return Ok(Reply::reject(GameError::InitiatorPicksFirst));
            }
            let opened = GameSession::open(participant.clone(), sign);
            let caption = session_caption(&opened);
            match router.store.create(context, opened)? {
                Opened::Created(id) => {
                    info!(session_id = %id, %sign, "Session opened");
                    return Ok(Reply::Update {
                        text: caption,
                        keyboard: sign_keyboard(initiator, Some(id), Some(sign)),
                    });
                }
                Opened::Existing(id) => {
                    debug!(session_id = %id, "Repeated first pick");
                    id
                }
            }
        }
    };

    settle(router.store.update(id, |game| {
        game.claim_sign(participant.clone(), sign)?;
        info!(session_id = %id, %sign, "Game started");
        Ok(Reply::Update {
            text: session_caption(game),
            keyboard: board_keyboard(id, &game.board()),
        })
    }))
}

/// "Pick cell": plays the presser's sign and re-renders the board.
#[instrument(skip_all, fields(user_id = %participant.id()))]
fn pick_cell<S: GameStore>(
    router: &Router<S>,
    _context: &str,
    participant: &Participant,
    action: &Action,
) -> Result<Reply, HandlerError> {
    let Action::PickCell(CellPick {
        session: id,
        position,
    }) = *action
    else {
        return Err(ProtocolError::Misrouted(action.kind()).into());
    };

    let Some(cell) = Position::from_index(usize::from(position)) else {
        debug!(position, "Cell index off the board");
        return Ok(Reply::reject(GameError::InvalidCell(position)));
    };

    let user = *participant.id();
    settle(router.store.update(id, |game| {
        let reply = match game.attempt_move(user, cell)? {
            MoveOutcome::Continue { board, next_turn } => {
                debug!(session_id = %id, %cell, %next_turn, "Move accepted");
                Reply::UpdateKeyboard {
                    keyboard: board_keyboard(id, &board),
                }
            }
            MoveOutcome::Finished { outcome, .. } => {
                info!(session_id = %id, ?outcome, "Game over");
                Reply::Finish {
                    text: final_text(game),
                }
            }
        };
        Ok(reply)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use xo_engine::{SessionId, Sign, UserId};

    #[test]
    fn test_invalid_cell_rejected_before_store() {
        let router = Router::new(InMemoryStore::new());
        let action = Action::PickCell(CellPick {
            session: SessionId(1),
            position: 9,
        });
        let reply = router
            .dispatch("m1", &Participant::new(UserId(1), "Alice".into()), &action)
            .unwrap();
        assert_eq!(reply, Reply::reject(GameError::InvalidCell(9)));
    }

    #[test]
    fn test_failed_dispatch_still_answers_the_press() {
        let failure = HandlerError::from(StoreError::backend("database is locked"));
        let (reply, err) = Reply::or_try_again(Err(failure));
        assert_eq!(reply, Reply::reject(TRY_AGAIN));
        assert!(matches!(err, Some(HandlerError::Store(_))));

        let (reply, err) = Reply::or_try_again(Ok(Reply::reject("taken")));
        assert_eq!(reply, Reply::reject("taken"));
        assert!(err.is_none());
    }

    #[test]
    fn test_misrouted_action_is_an_error() {
        let router = Router::new(InMemoryStore::new());
        let action = Action::PickSign(SignPick {
            initiator: UserId(1),
            sign: Sign::Cross,
            session: None,
        });
        let result = pick_cell(&router, "m1", &Participant::new(UserId(1), "Alice".into()), &action);
        assert!(matches!(
            result,
            Err(HandlerError::Protocol(ProtocolError::Misrouted(
                ActionKind::PickSign
            )))
        ));
    }
}
