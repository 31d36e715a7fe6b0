//! Win detection logic.

use crate::{Board, Position, Sign, Square};
use tracing::instrument;

/// Lines scanned for a winner, in scan order: rows, columns, diagonals.
pub const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [Position::MiddleLeft, Position::Center, Position::MiddleRight],
    [Position::BottomLeft, Position::BottomCenter, Position::BottomRight],
    // Columns
    [Position::TopLeft, Position::MiddleLeft, Position::BottomLeft],
    [Position::TopCenter, Position::Center, Position::BottomCenter],
    [Position::TopRight, Position::MiddleRight, Position::BottomRight],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Returns the sign holding the first completed line, if any.
///
/// The first match in [`LINES`] order wins, which makes the result deterministic
/// even for boards no alternating game can reach.
#[instrument]
pub fn check_winner(board: &Board) -> Option<Sign> {
    LINES.iter().find_map(|[a, b, c]| match board.get(*a) {
        Square::Occupied(sign) if board.get(*b) == board.get(*a) && board.get(*c) == board.get(*a) => {
            Some(sign)
        }
        _ => None,
    })
}
