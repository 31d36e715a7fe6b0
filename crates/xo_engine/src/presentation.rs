//! Rendering of captions, boards and keyboards.
//!
//! Everything here is plain text and a transport-neutral keyboard model;
//! the bot turns [`Keyboard`] into its own markup type.

use crate::protocol::{Action, CellPick, SignPick};
use crate::session::GameSession;
use crate::{Board, Position, SessionId, Sign, Square, UserId};
use derive_getters::Getters;
use derive_new::new;
use strum::IntoEnumIterator;
use tracing::instrument;

/// Cross glyph.
pub const CROSS: &str = "❌";
/// Circle glyph.
pub const CIRCLE: &str = "⭕️";
/// Free cell glyph.
pub const EMPTY: &str = "⬜️";
/// Placeholder for a side nobody has claimed.
pub const UNKNOWN: &str = "❓";
/// Winner marker.
pub const WINNER: &str = "🎉";
/// Loser marker.
pub const LOSER: &str = "💩";
/// Draw marker, shown for both sides.
pub const TIE: &str = "🤝";

/// Glyph for a sign.
pub fn sign_glyph(sign: Sign) -> &'static str {
    match sign {
        Sign::Cross => CROSS,
        Sign::Circle => CIRCLE,
    }
}

/// Glyph for a board cell.
pub fn square_glyph(square: Square) -> &'static str {
    match square {
        Square::Empty => EMPTY,
        Square::Occupied(sign) => sign_glyph(sign),
    }
}

/// Two-line player label; unassigned sides show [`UNKNOWN`].
pub fn caption(cross: Option<&str>, circle: Option<&str>) -> String {
    format!(
        "{CROSS} {}\n{CIRCLE} {}",
        cross.unwrap_or(UNKNOWN),
        circle.unwrap_or(UNKNOWN)
    )
}

/// Caption for a session's current seats.
pub fn session_caption(session: &GameSession) -> String {
    let name = move |sign| session.player_by_sign(sign).map(|p| p.name().as_str());
    caption(name(Sign::Cross), name(Sign::Circle))
}

/// Caption for a finished game: both tie, or winner celebrates and loser doesn't.
pub fn end_caption(cross: &str, circle: &str, winner: Option<Sign>) -> String {
    let marker = |sign: Sign| match winner {
        None => TIE,
        Some(w) if w == sign => WINNER,
        Some(_) => LOSER,
    };
    format!(
        "{CROSS} {cross} {}\n{CIRCLE} {circle} {}",
        marker(Sign::Cross),
        marker(Sign::Circle)
    )
}

/// Renders the board as three lines of three glyphs.
pub fn render_board(board: &Board) -> String {
    board
        .rows()
        .iter()
        .map(|row| row.iter().map(|s| square_glyph(*s)).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// End-of-game text: end caption, a blank line, then the final board.
#[instrument(skip(session))]
pub fn final_text(session: &GameSession) -> String {
    let name = move |sign| {
        session
            .player_by_sign(sign)
            .map(|p| p.name().as_str())
            .unwrap_or(UNKNOWN)
    };
    let winner = session.outcome().winner();
    format!(
        "{}\n\n{}",
        end_caption(name(Sign::Cross), name(Sign::Circle), winner),
        render_board(&session.board())
    )
}

/// An inline button and the action it re-invokes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct Button {
    label: String,
    action: Action,
}

/// Rows of buttons, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Default, Getters)]
pub struct Keyboard {
    rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Iterates every button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// One row with a button per sign nobody has taken yet.
#[instrument]
pub fn sign_keyboard(initiator: UserId, session: Option<SessionId>, taken: Option<Sign>) -> Keyboard {
    let row = Sign::iter()
        .filter(|sign| Some(*sign) != taken)
        .map(|sign| {
            Button::new(
                sign_glyph(sign).to_string(),
                Action::PickSign(SignPick {
                    initiator,
                    sign,
                    session,
                }),
            )
        })
        .collect();
    Keyboard { rows: vec![row] }
}

/// Three rows of three cells, each pressing "pick cell" at its position.
#[instrument(skip(board))]
pub fn board_keyboard(session: SessionId, board: &Board) -> Keyboard {
    let rows = Position::ALL
        .chunks(3)
        .map(|row| {
            row.iter()
                .map(|position| {
                    Button::new(
                        square_glyph(board.get(*position)).to_string(),
                        Action::PickCell(CellPick {
                            session,
                            position: position.to_u8(),
                        }),
                    )
                })
                .collect()
        })
        .collect();
    Keyboard { rows }
}

/// The inline article offered when a user summons the bot.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Invitation {
    title: String,
    description: String,
    text: String,
    keyboard: Keyboard,
}

impl Invitation {
    /// Empty caption plus both sign buttons, keyed to the inviting user.
    pub fn new(initiator: UserId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            text: caption(None, None),
            keyboard: sign_keyboard(initiator, None, None),
        }
    }
}
