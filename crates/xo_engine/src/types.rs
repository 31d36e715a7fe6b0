//! Core domain types for inline tic-tac-toe.

use crate::action::GameError;
use crate::position::Position;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Opaque identity of a chat user, supplied by the transport.
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
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Stable key of a stored game session.
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
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct SessionId(pub i64);

/// Marker a player owns for the whole session.
///
/// Serialized as `x` / `o` so it stays short inside callback data;
/// `Display`/`FromStr` use the long names stored in the database.
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
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Sign {
    /// Cross moves first.
    #[serde(rename = "x")]
    Cross,
    /// Circle moves second.
    #[serde(rename = "o")]
    Circle,
}

impl Sign {
    /// Returns the sign held by the opponent.
    pub fn opponent(self) -> Self {
        match self {
            Sign::Cross => Sign::Circle,
            Sign::Circle => Sign::Cross,
        }
    }
}

/// A cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Nobody has played here.
    Empty,
    /// Cell holds a sign.
    Occupied(Sign),
}

/// 3x3 board derived from a session's moves.
///
/// Cells are stored row-major, so `row = index / 3` and `column = index % 3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    squares: [Square; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Builds a board from `(position, sign)` placements.
    ///
    /// Later placements on the same cell overwrite earlier ones; sessions never
    /// produce such input because moves are validated before they are recorded.
    #[instrument(skip(placements))]
    pub fn from_placements(placements: impl IntoIterator<Item = (Position, Sign)>) -> Self {
        let mut board = Self::new();
        for (position, sign) in placements {
            board.squares[position.to_index()] = Square::Occupied(sign);
        }
        board
    }

    /// Returns the square at the given position.
    pub fn get(&self, position: Position) -> Square {
        self.squares[position.to_index()]
    }

    /// Checks if a cell is free.
    pub fn is_empty(&self, position: Position) -> bool {
        self.get(position) == Square::Empty
    }

    /// Returns a new board with `sign` placed at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CellOccupied`] if the cell already holds a sign.
    #[instrument(skip(self))]
    pub fn place(&self, position: Position, sign: Sign) -> Result<Board, GameError> {
        if !self.is_empty(position) {
            return Err(GameError::CellOccupied(position));
        }
        let mut next = self.clone();
        next.squares[position.to_index()] = Square::Occupied(sign);
        Ok(next)
    }

    /// Returns all squares in row-major order.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Returns the three rows, top to bottom.
    pub fn rows(&self) -> [[Square; 3]; 3] {
        let s = &self.squares;
        [[s[0], s[1], s[2]], [s[3], s[4], s[5]], [s[6], s[7], s[8]]]
    }

    /// Lists the cells nobody has played yet.
    pub fn empty_positions(&self) -> Vec<Position> {
        Position::ALL
            .iter()
            .copied()
            .filter(|position| self.is_empty(*position))
            .collect()
    }

    /// Number of occupied cells.
    pub fn filled(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_returns_new_board() {
        let board = Board::new();
        let next = board.place(Position::Center, Sign::Cross).unwrap();
        assert!(board.is_empty(Position::Center));
        assert_eq!(next.get(Position::Center), Square::Occupied(Sign::Cross));
    }

    #[test]
    fn test_place_on_occupied_cell_fails() {
        let board = Board::from_placements([(Position::TopLeft, Sign::Circle)]);
        let result = board.place(Position::TopLeft, Sign::Cross);
        assert_eq!(result, Err(GameError::CellOccupied(Position::TopLeft)));
    }

    #[test]
    fn test_rows_follow_row_major_layout() {
        let board = Board::from_placements([
            (Position::TopRight, Sign::Cross),
            (Position::BottomLeft, Sign::Circle),
        ]);
        let rows = board.rows();
        assert_eq!(rows[0][2], Square::Occupied(Sign::Cross));
        assert_eq!(rows[2][0], Square::Occupied(Sign::Circle));
        assert_eq!(board.filled(), 2);
        assert_eq!(board.empty_positions().len(), 7);
    }

    #[test]
    fn test_sign_names() {
        assert_eq!(Sign::Cross.to_string(), "cross");
        assert_eq!("circle".parse::<Sign>().unwrap(), Sign::Circle);
        assert_eq!(Sign::Cross.opponent(), Sign::Circle);
    }
}
