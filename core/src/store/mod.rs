//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Workflows call store methods — they never execute SQL directly.

use crate::{
    error::{DeskError, DeskResult},
    event::{DeskEvent, EventLogEntry},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

mod application;
mod bank;
mod claim;
mod notification;
mod recovery;
mod user;

pub use user::UserRow;

pub struct DeskStore {
    conn: Connection,
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to re-run.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_applications.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_claims.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_recoveries.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/005_banks_notifications.sql"))?;
        Ok(())
    }

    /// Run `f` inside one SQLite transaction. Every store call made by `f`
    /// goes through the same connection and therefore joins the transaction.
    /// Any error rolls the whole unit back.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> DeskResult<T>) -> DeskResult<T> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, event: &DeskEvent, at: DateTime<Utc>) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (application_id, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                event.application_id(),
                event.type_name(),
                serde_json::to_string(event)?,
                at,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_application(&self, application_id: &str) -> DeskResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, application_id, event_type, payload, created_at
             FROM event_log WHERE application_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![application_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, DateTime<Utc>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, application_id, event_type, payload, created_at)| {
                Ok(EventLogEntry {
                    id: Some(id),
                    application_id,
                    event_type,
                    payload: serde_json::from_str(&payload)?,
                    created_at,
                })
            })
            .collect()
    }

    pub fn event_count(&self, event_type: &str) -> DeskResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM event_log WHERE event_type = ?1",
                params![event_type],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // ── Demo reset ─────────────────────────────────────────────

    /// Clear every collection. Children go first so foreign keys hold.
    pub fn clear_all(&self) -> DeskResult<()> {
        self.conn.execute_batch(
            "DELETE FROM recovery_milestone;
             DELETE FROM recovery;
             DELETE FROM claim;
             DELETE FROM application_comment;
             DELETE FROM ncgc_note;
             DELETE FROM application;
             DELETE FROM notification;
             DELETE FROM event_log;
             DELETE FROM bank;
             DELETE FROM session;
             DELETE FROM app_user;",
        )?;
        log::debug!("All desk collections cleared");
        Ok(())
    }
}

/// Decode a JSON column, surfacing bad data as a conversion failure.
pub(crate) fn json_column<T: serde::de::DeserializeOwned>(
    idx: usize,
    raw: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Decode an enum stored as text.
pub(crate) fn enum_column<T>(
    idx: usize,
    raw: &str,
    parse: impl Fn(&str) -> DeskResult<T>,
) -> rusqlite::Result<T> {
    parse(raw).map_err(|e: DeskError| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
        )
    })
}
