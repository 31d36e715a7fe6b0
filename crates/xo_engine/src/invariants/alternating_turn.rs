//! Alternating turn invariant: cross first, then strictly alternating players.

use super::Invariant;
use crate::Sign;
use crate::session::{GameSession, SessionStatus};

/// Invariant: players alternate turns.
///
/// Move history must show cross, circle, cross, ... by seat, and while the
/// game runs `current_turn` must name the player whose sign is due next.
pub struct AlternatingTurnInvariant;

impl Invariant<GameSession> for AlternatingTurnInvariant {
    fn holds(session: &GameSession) -> bool {
        let cross = session.player_by_sign(Sign::Cross).map(|p| *p.id());
        let circle = session.player_by_sign(Sign::Circle).map(|p| *p.id());

        // Every move belongs to the seat whose sign is due at that index.
        let history_alternates = session.moves().iter().enumerate().all(|(i, m)| {
            let due = if i % 2 == 0 { cross } else { circle };
            due == Some(*m.player())
        });
        if !history_alternates {
            return false;
        }

        match session.status() {
            SessionStatus::Initial => {
                session.current_turn().is_none() || session.current_turn() == cross
            }
            SessionStatus::InProgress => {
                let due = if session.moves().len() % 2 == 0 {
                    cross
                } else {
                    circle
                };
                due.is_some() && session.current_turn() == due
            }
            SessionStatus::Finished => session.current_turn().is_none(),
        }
    }

    fn description() -> &'static str {
        "Players alternate turns (cross, circle, cross, ...)"
    }
}
