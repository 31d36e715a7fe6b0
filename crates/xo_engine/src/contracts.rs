//! Contract-based validation for session operations.
//!
//! Contracts formalize Hoare-style reasoning: {P} action {Q}.
//! Preconditions run before any mutation and decide the rejection the user
//! sees; postconditions re-check the invariants in debug builds.

use crate::action::GameError;
use crate::invariants::{InvariantSet, SessionInvariants};
use crate::session::{GameSession, SessionStatus};
use crate::{Position, Sign, UserId};
use derive_new::new;
use tracing::{debug, instrument};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Facts established by the precondition that the transition needs.
    type Checked;

    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<Self::Checked, GameError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), GameError>;
}

/// A user asking to play a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct MoveAttempt {
    /// Requesting user.
    pub user: UserId,
    /// Requested cell.
    pub position: Position,
}

/// A user asking for a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct SignClaim {
    /// Requesting user.
    pub user: UserId,
    /// Requested sign.
    pub sign: Sign,
}

/// What a legal move knows about its mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    /// Sign the mover plays.
    pub sign: Sign,
    /// Player who gets the turn next.
    pub opponent: UserId,
}

// ─────────────────────────────────────────────────────────────
//  Move Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the session accepts moves.
pub struct GameStarted;

impl GameStarted {
    /// `Initial` has no opponent yet; a `Finished` game has no players left to move.
    #[instrument(skip(session))]
    pub fn check(session: &GameSession) -> Result<(), GameError> {
        match session.status() {
            SessionStatus::InProgress => Ok(()),
            SessionStatus::Initial => Err(GameError::GameNotStarted),
            SessionStatus::Finished => Err(GameError::NotAParticipant),
        }
    }
}

/// Precondition: the requester is seated; yields their sign and opponent.
pub struct IsParticipant;

impl IsParticipant {
    #[instrument(skip(session))]
    pub fn check(session: &GameSession, user: UserId) -> Result<Seat, GameError> {
        let player = session.player(user).ok_or(GameError::NotAParticipant)?;
        let opponent = session
            .players()
            .iter()
            .find(|p| *p.id() != user)
            .ok_or(GameError::GameNotStarted)?;
        Ok(Seat {
            sign: *player.sign(),
            opponent: *opponent.id(),
        })
    }
}

/// Precondition: the requester owns the current turn.
pub struct PlayersTurn;

impl PlayersTurn {
    #[instrument(skip(session))]
    pub fn check(session: &GameSession, user: UserId) -> Result<(), GameError> {
        if session.current_turn() == Some(user) {
            Ok(())
        } else {
            debug!(current_turn = ?session.current_turn(), "Out-of-turn move");
            Err(GameError::NotYourTurn)
        }
    }
}

/// Precondition: the cell holds no sign.
pub struct CellIsFree;

impl CellIsFree {
    #[instrument(skip(session))]
    pub fn check(session: &GameSession, position: Position) -> Result<(), GameError> {
        if session.moves().iter().any(|m| *m.position() == position) {
            Err(GameError::CellOccupied(position))
        } else {
            Ok(())
        }
    }
}

/// Composite precondition, checked in rejection order.
pub struct LegalMove;

impl LegalMove {
    /// Validates all preconditions for a move.
    #[instrument(skip(session))]
    pub fn check(session: &GameSession, attempt: &MoveAttempt) -> Result<Seat, GameError> {
        GameStarted::check(session)?;
        let seat = IsParticipant::check(session, attempt.user)?;
        PlayersTurn::check(session, attempt.user)?;
        CellIsFree::check(session, attempt.position)?;
        Ok(seat)
    }
}

// ─────────────────────────────────────────────────────────────
//  Claim Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the requester holds no sign yet.
pub struct NotYetSeated;

impl NotYetSeated {
    #[instrument(skip(session))]
    pub fn check(session: &GameSession, user: UserId) -> Result<(), GameError> {
        match session.player(user) {
            Some(_) => Err(GameError::AlreadyClaimed),
            None => Ok(()),
        }
    }
}

/// Precondition: nobody holds the requested sign.
///
/// Once both signs are out this also turns away any third user.
pub struct SignAvailable;

impl SignAvailable {
    #[instrument(skip(session))]
    pub fn check(session: &GameSession, sign: Sign) -> Result<(), GameError> {
        match session.player_by_sign(sign) {
            Some(_) => Err(GameError::SignTaken(sign)),
            None => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Transition Postconditions
// ─────────────────────────────────────────────────────────────

/// Postcondition: status never moves backwards.
pub struct StatusMonotonic;

impl StatusMonotonic {
    pub fn holds(before: &GameSession, after: &GameSession) -> bool {
        after.status() >= before.status()
    }
}

/// Postcondition: moves and seats are only ever appended, and signs never change.
pub struct AppendOnly;

impl AppendOnly {
    pub fn holds(before: &GameSession, after: &GameSession) -> bool {
        let moves_kept = after.moves().starts_with(before.moves());
        let seats_kept = before.players().len() <= after.players().len()
            && before
                .players()
                .iter()
                .zip(after.players())
                .all(|(b, a)| b.id() == a.id() && b.sign() == a.sign());
        moves_kept && seats_kept
    }
}

#[instrument(skip(before, after))]
fn check_transition(before: &GameSession, after: &GameSession) -> Result<(), GameError> {
    if !StatusMonotonic::holds(before, after) {
        return Err(GameError::InvariantViolation(
            "Status moved backwards".to_string(),
        ));
    }
    if !AppendOnly::holds(before, after) {
        return Err(GameError::InvariantViolation(
            "Recorded moves or seats changed".to_string(),
        ));
    }
    SessionInvariants::check_all(after).map_err(|violations| {
        let descriptions = violations
            .iter()
            .map(|v| v.description.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        GameError::InvariantViolation(format!("Postcondition failed: {descriptions}"))
    })
}

// ─────────────────────────────────────────────────────────────
//  Contracts (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for cell picks.
///
/// Preconditions, in order:
/// - Session is in progress
/// - Requester is seated
/// - Requester owns the turn
/// - Cell is free
pub struct MoveContract;

impl Contract<GameSession, MoveAttempt> for MoveContract {
    type Checked = Seat;

    fn pre(session: &GameSession, attempt: &MoveAttempt) -> Result<Seat, GameError> {
        LegalMove::check(session, attempt)
    }

    fn post(before: &GameSession, after: &GameSession) -> Result<(), GameError> {
        if after.moves().len() != before.moves().len() + 1 {
            return Err(GameError::InvariantViolation(
                "A move must record exactly one placement".to_string(),
            ));
        }
        check_transition(before, after)
    }
}

/// Contract for sign picks on an existing session.
pub struct ClaimContract;

impl Contract<GameSession, SignClaim> for ClaimContract {
    type Checked = ();

    fn pre(session: &GameSession, claim: &SignClaim) -> Result<(), GameError> {
        NotYetSeated::check(session, claim.user)?;
        SignAvailable::check(session, claim.sign)
    }

    fn post(before: &GameSession, after: &GameSession) -> Result<(), GameError> {
        check_transition(before, after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Participant;

    fn started() -> GameSession {
        let mut session =
            GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
        session
            .claim_sign(Participant::new(UserId(2), "Bob".into()), Sign::Circle)
            .unwrap();
        session
    }

    #[test]
    fn test_precondition_initial_session() {
        let session = GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
        let attempt = MoveAttempt::new(UserId(1), Position::Center);
        assert_eq!(
            MoveContract::pre(&session, &attempt),
            Err(GameError::GameNotStarted)
        );
    }

    #[test]
    fn test_precondition_stranger() {
        let attempt = MoveAttempt::new(UserId(3), Position::Center);
        assert_eq!(
            MoveContract::pre(&started(), &attempt),
            Err(GameError::NotAParticipant)
        );
    }

    #[test]
    fn test_turn_checked_before_cell() {
        let mut session = started();
        session.attempt_move(UserId(1), Position::Center).unwrap();
        // Alice is out of turn and the cell is taken: turn wins.
        let attempt = MoveAttempt::new(UserId(1), Position::Center);
        assert_eq!(
            MoveContract::pre(&session, &attempt),
            Err(GameError::NotYourTurn)
        );
    }

    #[test]
    fn test_precondition_yields_seat() {
        let attempt = MoveAttempt::new(UserId(1), Position::Center);
        let seat = MoveContract::pre(&started(), &attempt).unwrap();
        assert_eq!(seat.sign, Sign::Cross);
        assert_eq!(seat.opponent, UserId(2));
    }

    #[test]
    fn test_claim_preconditions() {
        let session = GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
        assert_eq!(
            ClaimContract::pre(&session, &SignClaim::new(UserId(1), Sign::Circle)),
            Err(GameError::AlreadyClaimed)
        );
        assert_eq!(
            ClaimContract::pre(&session, &SignClaim::new(UserId(2), Sign::Cross)),
            Err(GameError::SignTaken(Sign::Cross))
        );
        assert!(ClaimContract::pre(&session, &SignClaim::new(UserId(2), Sign::Circle)).is_ok());
    }

    #[test]
    fn test_postcondition_detects_rewritten_history() {
        let before = started();
        let mut after = before.clone();
        after.attempt_move(UserId(1), Position::Center).unwrap();
        let mut corrupted = after.clone();
        corrupted.moves.clear();
        assert!(MoveContract::post(&before, &after).is_ok());
        assert!(MoveContract::post(&after, &corrupted).is_err());
    }
}
