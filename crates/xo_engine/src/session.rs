//! Game session state machine.
//!
//! A session walks `Initial -> InProgress -> Finished` and never goes back.
//! Every operation validates its preconditions (see [`crate::contracts`])
//! before touching state, so a rejected operation leaves the session exactly
//! as it was.

use crate::action::{GameError, Move};
use crate::contracts::{ClaimContract, Contract, MoveAttempt, MoveContract, SignClaim};
use crate::invariants::{InvariantSet, SessionInvariants};
use crate::rules::{self, Outcome};
use crate::{Board, Position, Sign, UserId};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Lifecycle stage of a session.
///
/// Variant order is lifecycle order, so `Ord` compares progress.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    /// At most one sign claimed.
    Initial,
    /// Both signs claimed, turns alternate.
    InProgress,
    /// Someone won or the board filled up.
    Finished,
}

/// Per-player result flag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum PlayerResult {
    /// Game running, or ended in a draw.
    Undecided,
    /// Completed a line.
    Winner,
    /// Opponent completed a line.
    Loser,
}

/// A user asking to join, as identified by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Participant {
    /// Transport user id.
    id: UserId,
    /// Display name used in captions.
    name: String,
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Player {
    id: UserId,
    name: String,
    sign: Sign,
    result: PlayerResult,
}

impl Player {
    /// Seats a participant with a sign; the result starts undecided.
    pub fn seat(participant: Participant, sign: Sign) -> Self {
        Self {
            id: participant.id,
            name: participant.name,
            sign,
            result: PlayerResult::Undecided,
        }
    }

    /// Rebuilds a stored player.
    pub fn restore(id: UserId, name: String, sign: Sign, result: PlayerResult) -> Self {
        Self {
            id,
            name,
            sign,
            result,
        }
    }
}

/// What an accepted move led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Game continues; the turn passed to `next_turn`.
    Continue {
        /// Board after the move.
        board: Board,
        /// Player who owns the next move.
        next_turn: UserId,
    },
    /// The move ended the game.
    Finished {
        /// Final board.
        board: Board,
        /// `CrossWins`, `CircleWins` or `Draw`.
        outcome: Outcome,
    },
}

/// One game between two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub(crate) status: SessionStatus,
    pub(crate) players: Vec<Player>,
    pub(crate) current_turn: Option<UserId>,
    pub(crate) moves: Vec<Move>,
}

impl GameSession {
    /// Opens a session for the first sign pick.
    ///
    /// Cross moves first, so a cross opener owns the turn straight away.
    #[instrument(skip(participant), fields(user_id = %participant.id()))]
    pub fn open(participant: Participant, sign: Sign) -> Self {
        let current_turn = (sign == Sign::Cross).then_some(*participant.id());
        info!(%sign, "Opening session");
        Self {
            status: SessionStatus::Initial,
            players: vec![Player::seat(participant, sign)],
            current_turn,
            moves: Vec::new(),
        }
    }

    /// Rebuilds a session from stored parts, rejecting states no sequence of
    /// valid operations could produce.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] naming every broken invariant.
    #[instrument(skip(players, moves), fields(players = players.len(), moves = moves.len()))]
    pub fn restore(
        status: SessionStatus,
        players: Vec<Player>,
        current_turn: Option<UserId>,
        moves: Vec<Move>,
    ) -> Result<Self, GameError> {
        let session = Self {
            status,
            players,
            current_turn,
            moves,
        };
        SessionInvariants::check_all(&session).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            GameError::InvariantViolation(descriptions)
        })?;
        Ok(session)
    }

    /// Seats a second participant with `sign` and starts the game.
    ///
    /// # Errors
    ///
    /// - [`GameError::AlreadyClaimed`] if the participant is already seated.
    /// - [`GameError::SignTaken`] if the sign belongs to the other player.
    #[instrument(skip(self, participant), fields(user_id = %participant.id()))]
    pub fn claim_sign(
        &mut self,
        participant: Participant,
        sign: Sign,
    ) -> Result<SessionStatus, GameError> {
        ClaimContract::pre(self, &SignClaim::new(*participant.id(), sign))?;

        #[cfg(debug_assertions)]
        let before = self.clone();

        self.players.push(Player::seat(participant, sign));
        if self.players.len() == 2 {
            self.status = SessionStatus::InProgress;
            if self.current_turn.is_none() {
                self.current_turn = self.player_by_sign(Sign::Cross).map(|p| p.id);
            }
        } else if sign == Sign::Cross {
            self.current_turn = self.player_by_sign(Sign::Cross).map(|p| p.id);
        }

        #[cfg(debug_assertions)]
        assert_transition::<ClaimContract, SignClaim>(&before, self);

        info!(%sign, status = %self.status, "Sign claimed");
        Ok(self.status)
    }

    /// Plays the requester's sign at `position`.
    ///
    /// # Errors
    ///
    /// - [`GameError::GameNotStarted`] before both signs are claimed.
    /// - [`GameError::NotAParticipant`] for strangers and finished games.
    /// - [`GameError::NotYourTurn`] if the other player owns the move.
    /// - [`GameError::CellOccupied`] if the cell already holds a sign.
    #[instrument(skip(self))]
    pub fn attempt_move(
        &mut self,
        user: UserId,
        position: Position,
    ) -> Result<MoveOutcome, GameError> {
        let seat = MoveContract::pre(self, &MoveAttempt::new(user, position))?;
        let board = self.board().place(position, seat.sign)?;

        #[cfg(debug_assertions)]
        let before = self.clone();

        self.moves.push(Move::new(user, position));
        let outcome = rules::evaluate(&board);
        debug!(?outcome, moves = self.moves.len(), "Board evaluated");

        let result = match outcome {
            Outcome::Ongoing => {
                self.current_turn = Some(seat.opponent);
                MoveOutcome::Continue {
                    board,
                    next_turn: seat.opponent,
                }
            }
            Outcome::CrossWins | Outcome::CircleWins | Outcome::Draw => {
                if let Some(winner) = outcome.winner() {
                    for player in &mut self.players {
                        player.result = if player.sign == winner {
                            PlayerResult::Winner
                        } else {
                            PlayerResult::Loser
                        };
                    }
                }
                self.status = SessionStatus::Finished;
                self.current_turn = None;
                info!(?outcome, "Game finished");
                MoveOutcome::Finished { board, outcome }
            }
        };

        #[cfg(debug_assertions)]
        assert_transition::<MoveContract, MoveAttempt>(&before, self);

        Ok(result)
    }

    /// Returns the lifecycle stage.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns seated players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Returns the player who owns the next move.
    pub fn current_turn(&self) -> Option<UserId> {
        self.current_turn
    }

    /// Returns recorded moves, oldest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Finds a seated player by user id.
    pub fn player(&self, user: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == user)
    }

    /// Finds the player holding `sign`.
    pub fn player_by_sign(&self, sign: Sign) -> Option<&Player> {
        self.players.iter().find(|p| p.sign == sign)
    }

    /// Rebuilds the board by replaying the moves.
    pub fn board(&self) -> Board {
        Board::from_placements(self.moves.iter().filter_map(|m| {
            self.player(*m.player()).map(|p| (*m.position(), p.sign))
        }))
    }

    /// Evaluates the current board.
    pub fn outcome(&self) -> Outcome {
        rules::evaluate(&self.board())
    }
}

#[cfg(debug_assertions)]
fn assert_transition<C, A>(before: &GameSession, after: &GameSession)
where
    C: Contract<GameSession, A>,
{
    let result = C::post(before, after);
    debug_assert!(result.is_ok(), "Postcondition failed: {result:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Participant {
        Participant::new(UserId(1), "Alice".to_string())
    }

    fn bob() -> Participant {
        Participant::new(UserId(2), "Bob".to_string())
    }

    #[test]
    fn test_cross_opener_owns_first_turn() {
        let session = GameSession::open(alice(), Sign::Cross);
        assert_eq!(session.status(), SessionStatus::Initial);
        assert_eq!(session.current_turn(), Some(UserId(1)));
    }

    #[test]
    fn test_circle_opener_waits_for_cross() {
        let mut session = GameSession::open(alice(), Sign::Circle);
        assert_eq!(session.current_turn(), None);

        let status = session.claim_sign(bob(), Sign::Cross).unwrap();
        assert_eq!(status, SessionStatus::InProgress);
        assert_eq!(session.current_turn(), Some(UserId(2)));
    }

    #[test]
    fn test_move_flips_turn() {
        let mut session = GameSession::open(alice(), Sign::Cross);
        session.claim_sign(bob(), Sign::Circle).unwrap();

        let outcome = session.attempt_move(UserId(1), Position::Center).unwrap();
        assert!(matches!(
            outcome,
            MoveOutcome::Continue { next_turn: UserId(2), .. }
        ));
        assert_eq!(session.current_turn(), Some(UserId(2)));
    }

    #[test]
    fn test_rejection_leaves_session_untouched() {
        let mut session = GameSession::open(alice(), Sign::Cross);
        session.claim_sign(bob(), Sign::Circle).unwrap();
        let snapshot = session.clone();

        assert_eq!(
            session.attempt_move(UserId(2), Position::Center),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(session, snapshot);
    }
}
