//! Unique cells invariant: a position is played at most once per session.

use super::Invariant;
use crate::session::GameSession;
use std::collections::HashSet;

/// Invariant: no two moves share a position.
pub struct UniqueCellsInvariant;

impl Invariant<GameSession> for UniqueCellsInvariant {
    fn holds(session: &GameSession) -> bool {
        let mut seen = HashSet::new();
        session.moves().iter().all(|m| seen.insert(*m.position()))
    }

    fn description() -> &'static str {
        "Each cell is played at most once"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Move;
    use crate::session::Participant;
    use crate::{Position, Sign, UserId};

    fn started() -> GameSession {
        let mut session =
            GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
        session
            .claim_sign(Participant::new(UserId(2), "Bob".into()), Sign::Circle)
            .unwrap();
        session
    }

    #[test]
    fn test_played_cells_hold() {
        let mut session = started();
        session.attempt_move(UserId(1), Position::Center).unwrap();
        session.attempt_move(UserId(2), Position::TopLeft).unwrap();
        assert!(UniqueCellsInvariant::holds(&session));
    }

    #[test]
    fn test_duplicate_cell_violates() {
        let mut session = started();
        session.moves.push(Move::new(UserId(1), Position::Center));
        session.moves.push(Move::new(UserId(2), Position::Center));
        assert!(!UniqueCellsInvariant::holds(&session));
    }
}
