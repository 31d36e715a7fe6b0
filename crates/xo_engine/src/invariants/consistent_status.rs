//! Consistent status invariant: the status agrees with seats, board and results.

use super::Invariant;
use crate::rules::Outcome;
use crate::session::{GameSession, PlayerResult, SessionStatus};

/// Invariant: status, seats, board outcome and player results agree.
///
/// - `Initial`: at most one seat, no moves.
/// - `InProgress`: two seats, board still ongoing.
/// - `Finished`: two seats, board decided.
///
/// Results are `Winner`/`Loser` only after a win; a draw leaves both undecided.
pub struct ConsistentStatusInvariant;

impl Invariant<GameSession> for ConsistentStatusInvariant {
    fn holds(session: &GameSession) -> bool {
        let seats = session.players().len();
        let outcome = session.outcome();

        let stage_ok = match session.status() {
            SessionStatus::Initial => seats <= 1 && session.moves().is_empty(),
            SessionStatus::InProgress => seats == 2 && outcome == Outcome::Ongoing,
            SessionStatus::Finished => seats == 2 && outcome.is_terminal(),
        };

        let winner = match session.status() {
            SessionStatus::Finished => outcome.winner(),
            SessionStatus::Initial | SessionStatus::InProgress => None,
        };
        let results_ok = session.players().iter().all(|p| {
            let expected = match winner {
                Some(sign) if *p.sign() == sign => PlayerResult::Winner,
                Some(_) => PlayerResult::Loser,
                None => PlayerResult::Undecided,
            };
            *p.result() == expected
        });

        stage_ok && results_ok
    }

    fn description() -> &'static str {
        "Status matches seats, board outcome and player results"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Participant;
    use crate::{Position, Sign, UserId};

    #[test]
    fn test_won_game_holds() {
        let mut session =
            GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
        session
            .claim_sign(Participant::new(UserId(2), "Bob".into()), Sign::Circle)
            .unwrap();
        for (user, position) in [
            (1, Position::TopLeft),
            (2, Position::MiddleLeft),
            (1, Position::TopCenter),
            (2, Position::Center),
            (1, Position::TopRight),
        ] {
            session.attempt_move(UserId(user), position).unwrap();
        }
        assert_eq!(session.status(), SessionStatus::Finished);
        assert!(ConsistentStatusInvariant::holds(&session));
    }

    #[test]
    fn test_premature_finish_violates() {
        let mut session =
            GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
        session
            .claim_sign(Participant::new(UserId(2), "Bob".into()), Sign::Circle)
            .unwrap();
        session.status = SessionStatus::Finished;
        assert!(!ConsistentStatusInvariant::holds(&session));
    }
}
