//! SQLite-backed [`GameStore`].

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};
use xo_engine::{GameSession, SessionId};

use super::models::{GameRow, MoveRow, NewGame, PlayerRow};
use super::schema;
use crate::store::{GameStore, Opened, StoreError, StoreErrorKind};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a writer waits for another writer's lock, in milliseconds.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Sessions stored in a SQLite database file.
///
/// Each call opens its own connection; `update` runs inside an `IMMEDIATE`
/// transaction so concurrent writers to one session serialize on SQLite's
/// write lock.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
}

impl SqliteStore {
    /// Creates a store for the database at `db_path`.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Self {
        info!(path = %db_path, "Creating SqliteStore");
        Self { db_path }
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    #[instrument(skip(self), fields(db_path = %self.db_path))]
    pub fn migrate(&self) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::backend(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::backend(format!("Failed to connect to '{}': {}", self.db_path, e))
        })?;
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))?;
        Ok(conn)
    }
}

/// Reads a whole session inside the caller's transaction.
#[instrument(skip(conn))]
fn read_session(conn: &mut SqliteConnection, id: SessionId) -> Result<GameSession, StoreError> {
    let game = schema::games::table
        .find(id.0)
        .select(GameRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| StoreError::not_found(id))?;

    let players = schema::players::table
        .filter(schema::players::game_id.eq(id.0))
        .order(schema::players::seat.asc())
        .select(PlayerRow::as_select())
        .load(conn)?
        .into_iter()
        .map(PlayerRow::into_player)
        .collect::<Result<Vec<_>, _>>()?;

    let moves = schema::moves::table
        .filter(schema::moves::game_id.eq(id.0))
        .order(schema::moves::seq.asc())
        .select(MoveRow::as_select())
        .load(conn)?
        .into_iter()
        .map(MoveRow::into_move)
        .collect::<Result<Vec<_>, _>>()?;

    let current_turn = game.current_turn().map(xo_engine::UserId);
    GameSession::restore(game.parse_status()?, players, current_turn, moves)
        .map_err(|e| StoreError::new(StoreErrorKind::Corrupt(e.to_string())))
}

/// Writes what changed between `before` and `after`.
///
/// Sessions only ever append seats and moves, so new rows are inserted and
/// existing player rows only have their result refreshed.
#[instrument(skip(conn, before, after))]
fn write_changes(
    conn: &mut SqliteConnection,
    id: SessionId,
    before: &GameSession,
    after: &GameSession,
) -> Result<(), StoreError> {
    let now = chrono::Utc::now().naive_utc();
    diesel::update(schema::games::table.find(id.0))
        .set((
            schema::games::status.eq(after.status().to_string()),
            schema::games::current_turn.eq(after.current_turn().map(|u| u.0)),
            schema::games::updated_at.eq(now),
        ))
        .execute(conn)?;

    let new_players: Vec<_> = after
        .players()
        .iter()
        .enumerate()
        .skip(before.players().len())
        .map(|(seat, player)| PlayerRow::from_player(id.0, seat, player))
        .collect();
    if !new_players.is_empty() {
        diesel::insert_into(schema::players::table)
            .values(&new_players)
            .execute(conn)?;
    }

    for player in after.players().iter().take(before.players().len()) {
        diesel::update(
            schema::players::table
                .filter(schema::players::game_id.eq(id.0))
                .filter(schema::players::user_id.eq(player.id().0)),
        )
        .set(schema::players::result.eq(player.result().to_string()))
        .execute(conn)?;
    }

    let new_moves: Vec<_> = after
        .moves()
        .iter()
        .enumerate()
        .skip(before.moves().len())
        .map(|(seq, m)| MoveRow::from_move(id.0, seq, m))
        .collect();
    if !new_moves.is_empty() {
        diesel::insert_into(schema::moves::table)
            .values(&new_moves)
            .execute(conn)?;
    }

    debug!(
        players = new_players.len(),
        moves = new_moves.len(),
        "Session rows written"
    );
    Ok(())
}

impl GameStore for SqliteStore {
    #[instrument(skip(self, session), fields(db_path = %self.db_path))]
    fn create(&self, context: &str, session: GameSession) -> Result<Opened, StoreError> {
        let mut conn = self.connection()?;
        let opened = conn.immediate_transaction::<_, StoreError, _>(|conn| {
            let existing = schema::games::table
                .filter(schema::games::context.eq(context))
                .select(schema::games::id)
                .first::<i64>(conn)
                .optional()?;
            if let Some(id) = existing {
                debug!(session_id = id, "Context already has a session");
                return Ok(Opened::Existing(SessionId(id)));
            }

            let new_game = NewGame::new(
                context.to_string(),
                session.status().to_string(),
                session.current_turn().map(|u| u.0),
            );
            let id = diesel::insert_into(schema::games::table)
                .values(&new_game)
                .returning(schema::games::id)
                .get_result::<i64>(conn)?;

            let players: Vec<_> = session
                .players()
                .iter()
                .enumerate()
                .map(|(seat, player)| PlayerRow::from_player(id, seat, player))
                .collect();
            diesel::insert_into(schema::players::table)
                .values(&players)
                .execute(conn)?;
            info!(session_id = id, "Session stored");
            Ok(Opened::Created(SessionId(id)))
        })?;

        Ok(opened)
    }

    #[instrument(skip(self), fields(db_path = %self.db_path))]
    fn load(&self, id: SessionId) -> Result<GameSession, StoreError> {
        let mut conn = self.connection()?;
        read_session(&mut conn, id)
    }

    #[instrument(skip(self, f), fields(db_path = %self.db_path))]
    fn update<T, E, F>(&self, id: SessionId, f: F) -> Result<Result<T, E>, StoreError>
    where
        F: FnOnce(&mut GameSession) -> Result<T, E>,
    {
        let mut conn = self.connection()?;
        conn.immediate_transaction::<_, StoreError, _>(|conn| {
            let before = read_session(conn, id)?;
            let mut after = before.clone();
            let result = f(&mut after);
            if result.is_ok() {
                write_changes(conn, id, &before, &after)?;
                debug!(session_id = %id, status = %after.status(), "Session committed");
            } else {
                debug!(session_id = %id, "Update rejected, nothing committed");
            }
            Ok(result)
        })
    }
}
