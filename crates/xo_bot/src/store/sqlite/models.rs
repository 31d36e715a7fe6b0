//! Row types and their mapping to engine types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use std::str::FromStr;
use tracing::instrument;
use xo_engine::{Move, Player, PlayerResult, Position, SessionStatus, Sign, UserId};

use super::schema;
use crate::store::{StoreError, StoreErrorKind};

/// Game row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRow {
    id: i64,
    context: String,
    status: String,
    current_turn: Option<i64>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Insertable game row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games)]
pub struct NewGame {
    context: String,
    status: String,
    current_turn: Option<i64>,
}

/// Player row; `seat` keeps join order.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters, new)]
#[diesel(table_name = schema::players)]
pub struct PlayerRow {
    game_id: i64,
    user_id: i64,
    seat: i32,
    name: String,
    sign: String,
    result: String,
}

/// Move row; `seq` keeps move order.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters, new)]
#[diesel(table_name = schema::moves)]
pub struct MoveRow {
    game_id: i64,
    seq: i32,
    user_id: i64,
    position: i32,
}

#[track_caller]
fn corrupt(message: String) -> StoreError {
    StoreError::new(StoreErrorKind::Corrupt(message))
}

/// Parses a strum-encoded column.
#[track_caller]
pub fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
    T::from_str(value).map_err(|_| corrupt(format!("Invalid {column}: '{value}'")))
}

impl GameRow {
    /// Stored status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the column holds an unknown status.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn parse_status(&self) -> Result<SessionStatus, StoreError> {
        parse_column("status", &self.status)
    }
}

impl PlayerRow {
    /// Row for a seated player.
    pub fn from_player(game_id: i64, seat: usize, player: &Player) -> Self {
        Self::new(
            game_id,
            player.id().0,
            seat as i32,
            player.name().clone(),
            player.sign().to_string(),
            player.result().to_string(),
        )
    }

    /// Rebuilds the engine player.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the sign or result column is invalid.
    #[instrument(skip(self), fields(game_id = self.game_id, user_id = self.user_id))]
    pub fn into_player(self) -> Result<Player, StoreError> {
        let sign: Sign = parse_column("sign", &self.sign)?;
        let result: PlayerResult = parse_column("result", &self.result)?;
        Ok(Player::restore(UserId(self.user_id), self.name, sign, result))
    }
}

impl MoveRow {
    /// Row for the `seq`-th move.
    pub fn from_move(game_id: i64, seq: usize, m: &Move) -> Self {
        Self::new(
            game_id,
            seq as i32,
            m.player().0,
            i32::from(m.position().to_u8()),
        )
    }

    /// Rebuilds the engine move.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the position is off the board.
    #[instrument(skip(self), fields(game_id = self.game_id, seq = self.seq))]
    pub fn into_move(self) -> Result<Move, StoreError> {
        let position = usize::try_from(self.position)
            .ok()
            .and_then(Position::from_index)
            .ok_or_else(|| corrupt(format!("Invalid position: {}", self.position)))?;
        Ok(Move::new(UserId(self.user_id), position))
    }
}
