//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`]: no session state, no side effects, so the
//! same board always evaluates to the same [`Outcome`].

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{LINES, check_winner};

use crate::{Board, Sign};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Cross completed a line.
    CrossWins,
    /// Circle completed a line.
    CircleWins,
    /// All nine cells filled, no line completed.
    Draw,
    /// Game goes on.
    Ongoing,
}

impl Outcome {
    /// Sign that won, if any.
    pub fn winner(self) -> Option<Sign> {
        match self {
            Outcome::CrossWins => Some(Sign::Cross),
            Outcome::CircleWins => Some(Sign::Circle),
            Outcome::Draw | Outcome::Ongoing => None,
        }
    }

    /// True once no further move is possible.
    pub fn is_terminal(self) -> bool {
        self != Outcome::Ongoing
    }
}

impl From<Sign> for Outcome {
    fn from(sign: Sign) -> Self {
        match sign {
            Sign::Cross => Outcome::CrossWins,
            Sign::Circle => Outcome::CircleWins,
        }
    }
}

/// Evaluates a board: a completed line wins, a full board draws, otherwise ongoing.
#[instrument]
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(sign) = check_winner(board) {
        Outcome::from(sign)
    } else if is_full(board) {
        Outcome::Draw
    } else {
        Outcome::Ongoing
    }
}
