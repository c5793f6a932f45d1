use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::CoreError;
use crate::models::WatchEntry;

const SCHEMA_V1: &str = include_str!("../../../migrations/001_initial.sql");
const SCHEMA_V2: &str = include_str!("../../../migrations/002_intents.sql");

/// Token slot used for the signed-in user's session.
pub const SESSION_SERVICE: &str = "session";

/// SQLite-backed storage for client-side state.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    // ── Auth Tokens ─────────────────────────────────────────────

    /// Store the token for a service, replacing any previous one.
    pub fn save_token(&self, service: &str, token: &str) -> Result<(), CoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO auth_tokens (service, token, saved_at)
             VALUES (?1, ?2, ?3)",
            params![service, token, format_datetime(Utc::now())],
        )?;
        Ok(())
    }

    /// Get the token for a service.
    pub fn get_token(&self, service: &str) -> Result<Option<String>, CoreError> {
        self.conn
            .query_row(
                "SELECT token FROM auth_tokens WHERE service = ?1",
                params![service],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Forget the token for a service. Missing tokens are not an error.
    pub fn clear_token(&self, service: &str) -> Result<(), CoreError> {
        self.conn
            .execute("DELETE FROM auth_tokens WHERE service = ?1", params![service])?;
        Ok(())
    }

    // ── Watch History ───────────────────────────────────────────

    /// Insert or update the playback position for a title.
    pub fn record_progress(&self, entry: &WatchEntry) -> Result<(), CoreError> {
        self.conn.execute(
            "INSERT INTO watch_history
                (media_id, title, poster_url, position_secs, duration_secs, watched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(media_id) DO UPDATE SET
                title = excluded.title,
                poster_url = COALESCE(excluded.poster_url, watch_history.poster_url),
                position_secs = excluded.position_secs,
                duration_secs = COALESCE(excluded.duration_secs, watch_history.duration_secs),
                watched_at = excluded.watched_at",
            params![
                entry.media_id,
                entry.title,
                entry.poster_url,
                entry.position_secs,
                entry.duration_secs,
                format_datetime(entry.watched_at),
            ],
        )?;
        Ok(())
    }

    /// Most recently watched titles, newest first.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<WatchEntry>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT media_id, title, poster_url, position_secs, duration_secs, watched_at
             FROM watch_history
             ORDER BY watched_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], row_to_watch_entry)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Get the history entry for one title.
    pub fn get_history(&self, media_id: u32) -> Result<Option<WatchEntry>, CoreError> {
        self.conn
            .query_row(
                "SELECT media_id, title, poster_url, position_secs, duration_secs, watched_at
                 FROM watch_history WHERE media_id = ?1",
                params![media_id],
                row_to_watch_entry,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Remove a title from history. Returns whether a row was deleted.
    pub fn remove_history(&self, media_id: u32) -> Result<bool, CoreError> {
        let n = self.conn.execute(
            "DELETE FROM watch_history WHERE media_id = ?1",
            params![media_id],
        )?;
        Ok(n > 0)
    }

    // ── Intents ─────────────────────────────────────────────────

    /// Remember something to act on after the user signs in.
    pub fn set_intent(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO intents (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Read and delete an intent in one step.
    pub fn take_intent(&mut self, key: &str) -> Result<Option<String>, CoreError> {
        let tx = self.conn.transaction()?;
        let value: Option<String> = tx
            .query_row(
                "SELECT value FROM intents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        if value.is_some() {
            tx.execute("DELETE FROM intents WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(value)
    }
}

fn run_migrations(conn: &Connection) -> Result<(), CoreError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    if version < 2 {
        conn.execute_batch(SCHEMA_V2)?;
        conn.pragma_update(None, "user_version", 2)?;
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

fn row_to_watch_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<WatchEntry> {
    let watched_at: String = row.get(5)?;
    Ok(WatchEntry {
        media_id: row.get(0)?,
        title: row.get(1)?,
        poster_url: row.get(2)?,
        position_secs: row.get(3)?,
        duration_secs: row.get(4)?,
        watched_at: parse_datetime(&watched_at),
    })
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string from SQLite (either RFC 3339 or SQLite's `datetime('now')` format).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| Utc::now())
}
