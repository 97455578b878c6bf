//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The session calls store methods; it never executes SQL directly.

use crate::{
    error::GameResult,
    event::{EventLogEntry, GameEvent},
    snapshot::{self, SAVE_VERSION},
    state::GameState,
    types::Timestamp,
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SaveStore {
    conn: Connection,
}

impl SaveStore {
    /// Open (or create) the save database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Save slot ──────────────────────────────────────────────

    /// Write `state` as the player's only save, replacing any previous one.
    pub fn save(&self, player_id: &str, saved_at: Timestamp, state: &GameState) -> GameResult<()> {
        let json = snapshot::encode(state)?;
        self.conn.execute(
            "INSERT INTO save_slot (player_id, version, saved_at, state_json)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(player_id) DO UPDATE SET
                version = excluded.version,
                saved_at = excluded.saved_at,
                state_json = excluded.state_json",
            params![player_id, SAVE_VERSION, saved_at.as_millis(), json],
        )?;
        log::info!("Saved game for {player_id} at {saved_at}");
        Ok(())
    }

    /// The player's save and when it was written, if any.
    ///
    /// A corrupt save is `PersistedStateInvalid`, not `None`.
    pub fn load(&self, player_id: &str) -> GameResult<Option<(Timestamp, GameState)>> {
        let row = self
            .conn
            .query_row(
                "SELECT saved_at, state_json FROM save_slot WHERE player_id = ?1",
                params![player_id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        match row {
            Some((saved_at, json)) => {
                let state = snapshot::decode(&json)?;
                Ok(Some((Timestamp::from_millis(saved_at), state)))
            }
            None => Ok(None),
        }
    }

    pub fn delete_save(&self, player_id: &str) -> GameResult<bool> {
        let n = self
            .conn
            .execute("DELETE FROM save_slot WHERE player_id = ?1", params![player_id])?;
        Ok(n > 0)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, session_id: &str, player_id: &str, event: &GameEvent) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, player_id, at, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session_id,
                player_id,
                event.at().as_millis(),
                event.type_name(),
                serde_json::to_string(event)?,
            ],
        )?;
        Ok(())
    }

    pub fn events(&self, session_id: &str) -> GameResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, at, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    session_id: row.get(1)?,
                    at:         Timestamp::from_millis(row.get(2)?),
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
