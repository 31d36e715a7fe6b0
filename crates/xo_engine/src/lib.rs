//! Tic-tac-toe session engine for inline chat games.
//!
//! # Architecture
//!
//! - **Board**: 3x3 grid derived from a session's ordered moves
//! - **Rules**: pure win/draw evaluation
//! - **Session**: two players, sign assignment, turn order, move validation
//! - **Presentation**: captions, rendered boards and keyboard layouts
//! - **Protocol**: the button actions a transport sends back
//!
//! Nothing in this crate performs I/O; storage and transport live in the bot.
//!
//! # Example
//!
//! ```
//! use xo_engine::{GameSession, MoveOutcome, Participant, Position, Sign, UserId};
//!
//! let mut session = GameSession::open(Participant::new(UserId(1), "Alice".into()), Sign::Cross);
//! session.claim_sign(Participant::new(UserId(2), "Bob".into()), Sign::Circle)?;
//!
//! let outcome = session.attempt_move(UserId(1), Position::Center)?;
//! assert!(matches!(outcome, MoveOutcome::Continue { .. }));
//! # Ok::<(), xo_engine::GameError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod position;
mod session;
mod types;

pub mod contracts;
pub mod invariants;
pub mod presentation;
pub mod protocol;
pub mod rules;

pub use action::{GameError, Move};
pub use position::Position;
pub use rules::{Outcome, evaluate};
pub use session::{GameSession, MoveOutcome, Participant, Player, PlayerResult, SessionStatus};
pub use types::{Board, SessionId, Sign, Square, UserId};
