//! Callback actions carried by inline keyboard buttons.
//!
//! Buttons carry their action as compact JSON, internally tagged by `name`:
//!
//! ```text
//! {"name":"xo_sign","id":42,"sign":"x","game":null}
//! {"name":"xo_field","game_id":7,"pos":4}
//! ```
//!
//! Telegram caps callback data at 64 bytes, so field names stay short and
//! [`Action::encode`] refuses anything longer.

use crate::{Sign, SessionId, UserId};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Telegram's limit on callback data, in bytes.
pub const MAX_CALLBACK_DATA: usize = 64;

/// Discriminant used to route an action to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    /// A sign button was pressed.
    PickSign,
    /// A board cell was pressed.
    PickCell,
}

/// "Pick sign" button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignPick {
    /// User who posted the game invitation.
    #[serde(rename = "id")]
    pub initiator: UserId,
    /// Sign on the button.
    pub sign: Sign,
    /// Session created by the first pick, absent before it.
    #[serde(rename = "game")]
    pub session: Option<SessionId>,
}

/// "Pick cell" button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPick {
    /// Session the board belongs to.
    #[serde(rename = "game_id")]
    pub session: SessionId,
    /// Raw cell index; validated into a [`crate::Position`] by the handler.
    #[serde(rename = "pos")]
    pub position: u8,
}

/// An action a button re-invokes when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Action {
    /// Claim a sign (opens the session on the first pick).
    #[serde(rename = "xo_sign")]
    PickSign(SignPick),
    /// Play a cell.
    #[serde(rename = "xo_field")]
    PickCell(CellPick),
}

impl Action {
    /// Returns the routing discriminant.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::PickSign(_) => ActionKind::PickSign,
            Action::PickCell(_) => ActionKind::PickCell,
        }
    }

    /// Serializes to callback data.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::TooLong`] if the payload exceeds
    /// [`MAX_CALLBACK_DATA`].
    #[instrument]
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let data =
            serde_json::to_string(self).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        if data.len() > MAX_CALLBACK_DATA {
            warn!(len = data.len(), "Callback data over the transport limit");
            return Err(ProtocolError::TooLong(data.len()));
        }
        Ok(data)
    }

    /// Parses callback data.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] for anything that is not an action.
    #[instrument]
    pub fn decode(data: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(data).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

/// Callback data the bot cannot act on.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ProtocolError {
    /// Not valid action JSON.
    #[display("Malformed callback data: {_0}")]
    Malformed(String),

    /// Encoded action longer than the transport accepts.
    #[display("Callback data is {_0} bytes, limit is 64")]
    TooLong(usize),

    /// An action reached the handler for another kind.
    #[display("Action {_0} routed to the wrong handler")]
    Misrouted(ActionKind),

    /// No handler registered for the kind.
    #[display("No route for action {_0}")]
    Unrouted(ActionKind),
}

impl std::error::Error for ProtocolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_pick_wire_format() {
        let action = Action::PickSign(SignPick {
            initiator: UserId(42),
            sign: Sign::Cross,
            session: None,
        });
        assert_eq!(
            action.encode().unwrap(),
            r#"{"name":"xo_sign","id":42,"sign":"x","game":null}"#
        );
    }

    #[test]
    fn test_cell_pick_wire_format() {
        let action = Action::decode(r#"{"name":"xo_field","game_id":7,"pos":4}"#).unwrap();
        assert_eq!(
            action,
            Action::PickCell(CellPick {
                session: SessionId(7),
                position: 4,
            })
        );
        assert_eq!(action.kind(), ActionKind::PickCell);
    }

    #[test]
    fn test_largest_ids_fit_callback_limit() {
        let action = Action::PickSign(SignPick {
            initiator: UserId(9_999_999_999),
            sign: Sign::Circle,
            session: Some(SessionId(99_999_999)),
        });
        assert!(action.encode().is_ok());
    }

    #[test]
    fn test_unknown_name_is_malformed() {
        let result = Action::decode(r#"{"name":"chess","pos":1}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }
}
