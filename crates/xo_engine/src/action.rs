//! Moves and the rejections a session can answer with.
//!
//! Moves are domain events: they name who played where and are validated
//! against the session before they are recorded.

use crate::{Position, Sign, UserId};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// A recorded placement: a player's sign at a position.
///
/// The sign is not stored; it is looked up from the player when the board is
/// rebuilt, so a move can never disagree with its player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, new)]
pub struct Move {
    /// The player making the move.
    player: UserId,
    /// The cell played.
    position: Position,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.player, self.position.label())
    }
}

/// A user action the session refuses.
///
/// Every variant is recoverable by the user; `Display` is the notice shown to
/// the requester.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// The requester already holds a sign in this session.
    #[display("You have already picked a side. Wait 🕘🕥")]
    AlreadyClaimed,

    /// The other player already holds the requested sign.
    #[display("The {_0} side is already taken")]
    SignTaken(Sign),

    /// Somebody other than the game's creator tried to pick first.
    #[display("The game creator picks a side first. Wait 🕘🕥")]
    InitiatorPicksFirst,

    /// A cell was picked before both signs were assigned.
    #[display("The game has not started yet. Wait for a second player 🕘🕥")]
    GameNotStarted,

    /// The requester is not playing in this session, or it is over.
    #[display("You are not taking part in this game")]
    NotAParticipant,

    /// The requester does not own the current turn.
    #[display("It is not your turn. Wait 🕘🕥")]
    NotYourTurn,

    /// The cell already holds a sign.
    #[display("That cell is taken. Pick another one")]
    CellOccupied(Position),

    /// The transport sent a cell index outside 0-8.
    #[display("There is no cell {_0}")]
    InvalidCell(u8),

    /// Stored state broke a session invariant.
    #[display("Invariant violation: {_0}")]
    InvariantViolation(String),
}

impl std::error::Error for GameError {}
