//! Distinct seats invariant: two players at most, one per sign.

use super::Invariant;
use crate::session::GameSession;

/// Invariant: at most two players, with different ids and different signs.
pub struct DistinctSeatsInvariant;

impl Invariant<GameSession> for DistinctSeatsInvariant {
    fn holds(session: &GameSession) -> bool {
        match session.players() {
            [] | [_] => true,
            [a, b] => a.id() != b.id() && a.sign() != b.sign(),
            _ => false,
        }
    }

    fn description() -> &'static str {
        "At most one player per sign, and no player seated twice"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Participant, Player};
    use crate::{Sign, UserId};

    #[test]
    fn test_two_signs_hold() {
        let mut session =
            GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
        session
            .claim_sign(Participant::new(UserId(2), "Bob".into()), Sign::Circle)
            .unwrap();
        assert!(DistinctSeatsInvariant::holds(&session));
    }

    #[test]
    fn test_shared_sign_violates() {
        let mut session =
            GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
        session
            .players
            .push(Player::seat(Participant::new(UserId(2), "Bob".into()), Sign::Cross));
        assert!(!DistinctSeatsInvariant::holds(&session));
    }
}
