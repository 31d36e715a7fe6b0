//! Tests for the session state machine.

use std::collections::HashSet;
use xo_engine::{
    GameError, GameSession, MoveOutcome, Outcome, Participant, PlayerResult, Position,
    SessionStatus, Sign, UserId,
};

const ALICE: UserId = UserId(101);
const BOB: UserId = UserId(202);
const CAROL: UserId = UserId(303);

fn participant(id: UserId) -> Participant {
    Participant::new(id, format!("user{id}"))
}

/// Alice holds cross, Bob holds circle, game in progress.
fn started() -> GameSession {
    let mut session = GameSession::open(participant(ALICE), Sign::Cross);
    session
        .claim_sign(participant(BOB), Sign::Circle)
        .expect("Second claim");
    session
}

fn play(session: &mut GameSession, moves: &[(UserId, usize)]) -> MoveOutcome {
    let mut last = None;
    for (user, index) in moves {
        let position = Position::from_index(*index).expect("Valid index");
        last = Some(session.attempt_move(*user, position).expect("Legal move"));
    }
    last.expect("At least one move")
}

#[test]
fn test_second_claim_starts_game() {
    let session = started();
    assert_eq!(session.status(), SessionStatus::InProgress);
    assert_eq!(session.current_turn(), Some(ALICE));
    assert_eq!(session.players().len(), 2);
}

#[test]
fn test_claiming_held_sign_fails() {
    let mut session = GameSession::open(participant(ALICE), Sign::Cross);
    let result = session.claim_sign(participant(BOB), Sign::Cross);
    assert_eq!(result, Err(GameError::SignTaken(Sign::Cross)));
    assert_eq!(session.status(), SessionStatus::Initial);
    assert_eq!(session.players().len(), 1);
}

#[test]
fn test_claiming_twice_fails() {
    let mut session = GameSession::open(participant(ALICE), Sign::Circle);
    let result = session.claim_sign(participant(ALICE), Sign::Cross);
    assert_eq!(result, Err(GameError::AlreadyClaimed));
}

#[test]
fn test_third_user_cannot_join() {
    let mut session = started();
    let result = session.claim_sign(participant(CAROL), Sign::Circle);
    assert_eq!(result, Err(GameError::SignTaken(Sign::Circle)));
}

#[test]
fn test_occupied_cell_rejected_and_board_unchanged() {
    let mut session = started();
    play(&mut session, &[(ALICE, 4)]);
    let board_before = session.board();

    let result = session.attempt_move(BOB, Position::Center);
    assert_eq!(result, Err(GameError::CellOccupied(Position::Center)));
    assert_eq!(session.board(), board_before);
    assert_eq!(session.moves().len(), 1);
    assert_eq!(session.current_turn(), Some(BOB));
}

#[test]
fn test_out_of_turn_move_not_recorded() {
    let mut session = started();
    let result = session.attempt_move(BOB, Position::TopLeft);
    assert_eq!(result, Err(GameError::NotYourTurn));
    assert!(session.moves().is_empty());
}

#[test]
fn test_stranger_move_rejected() {
    let mut session = started();
    let result = session.attempt_move(CAROL, Position::TopLeft);
    assert_eq!(result, Err(GameError::NotAParticipant));
}

#[test]
fn test_move_before_second_player_rejected() {
    let mut session = GameSession::open(participant(ALICE), Sign::Cross);
    let result = session.attempt_move(ALICE, Position::TopLeft);
    assert_eq!(result, Err(GameError::GameNotStarted));
}

#[test]
fn test_win_marks_players_and_finishes() {
    let mut session = started();
    let outcome = play(
        &mut session,
        &[(ALICE, 0), (BOB, 4), (ALICE, 1), (BOB, 3), (ALICE, 2)],
    );

    assert!(matches!(
        outcome,
        MoveOutcome::Finished {
            outcome: Outcome::CrossWins,
            ..
        }
    ));
    assert_eq!(session.status(), SessionStatus::Finished);
    assert_eq!(session.current_turn(), None);
    assert_eq!(
        *session.player(ALICE).unwrap().result(),
        PlayerResult::Winner
    );
    assert_eq!(*session.player(BOB).unwrap().result(), PlayerResult::Loser);
}

#[test]
fn test_circle_can_win() {
    let mut session = started();
    let outcome = play(
        &mut session,
        &[(ALICE, 0), (BOB, 2), (ALICE, 1), (BOB, 4), (ALICE, 8), (BOB, 6)],
    );
    assert!(matches!(
        outcome,
        MoveOutcome::Finished {
            outcome: Outcome::CircleWins,
            ..
        }
    ));
    assert_eq!(*session.player(BOB).unwrap().result(), PlayerResult::Winner);
}

#[test]
fn test_draw_leaves_results_undecided() {
    let mut session = started();
    // Final board:
    // ❌⭕️❌
    // ❌⭕️⭕️
    // ⭕️❌❌
    let outcome = play(
        &mut session,
        &[
            (ALICE, 0),
            (BOB, 1),
            (ALICE, 2),
            (BOB, 4),
            (ALICE, 3),
            (BOB, 5),
            (ALICE, 7),
            (BOB, 6),
            (ALICE, 8),
        ],
    );
    assert!(matches!(
        outcome,
        MoveOutcome::Finished {
            outcome: Outcome::Draw,
            ..
        }
    ));
    assert_eq!(session.status(), SessionStatus::Finished);
    assert!(
        session
            .players()
            .iter()
            .all(|p| *p.result() == PlayerResult::Undecided)
    );
}

#[test]
fn test_finished_game_rejects_moves() {
    let mut session = started();
    play(
        &mut session,
        &[(ALICE, 0), (BOB, 4), (ALICE, 1), (BOB, 3), (ALICE, 2)],
    );
    let result = session.attempt_move(BOB, Position::BottomRight);
    assert_eq!(result, Err(GameError::NotAParticipant));
}

#[test]
fn test_restore_rejects_duplicate_cells() {
    let mut session = started();
    play(&mut session, &[(ALICE, 0), (BOB, 4)]);
    let mut moves = session.moves().to_vec();
    moves.push(moves[0]);

    let result = GameSession::restore(
        session.status(),
        session.players().to_vec(),
        session.current_turn(),
        moves,
    );
    assert!(matches!(result, Err(GameError::InvariantViolation(_))));
}

#[test]
fn test_restore_round_trips_valid_session() {
    let mut session = started();
    play(&mut session, &[(ALICE, 0), (BOB, 4), (ALICE, 8)]);
    let restored = GameSession::restore(
        session.status(),
        session.players().to_vec(),
        session.current_turn(),
        session.moves().to_vec(),
    )
    .expect("Valid parts");
    assert_eq!(restored, session);
}

/// Walks every reachable game and checks cell uniqueness and turn alternation
/// after each accepted move.
#[test]
fn test_every_reachable_game_keeps_invariants() {
    fn explore(session: &GameSession, games: &mut usize) {
        if session.status() == SessionStatus::Finished {
            *games += 1;
            return;
        }
        let mover = session.current_turn().expect("Running game has a turn");
        let waiting = if mover == ALICE { BOB } else { ALICE };

        for position in session.board().empty_positions() {
            let mut next = session.clone();
            next.attempt_move(mover, position).expect("Free cell on own turn");

            let cells: HashSet<_> = next.moves().iter().map(|m| *m.position()).collect();
            assert_eq!(cells.len(), next.moves().len());
            if next.status() == SessionStatus::InProgress {
                assert_eq!(next.current_turn(), Some(waiting));
            }
            explore(&next, games);
        }
    }

    let mut games = 0;
    explore(&started(), &mut games);
    assert_eq!(games, 255_168);
}
