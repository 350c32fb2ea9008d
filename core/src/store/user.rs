use super::{enum_column, DeskStore};
use crate::{error::DeskResult, types::Role};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

/// A stored credential. The hash is an Argon2id PHC string.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub email: String,
    pub role: Role,
    pub bank: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

fn user_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        email: row.get(0)?,
        role: enum_column(1, &row.get::<_, String>(1)?, Role::parse)?,
        bank: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl DeskStore {
    // ── Users ──────────────────────────────────────────────────────

    pub fn insert_user(&self, u: &UserRow) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO app_user (email, role, bank, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &u.email,
                u.role.as_str(),
                u.bank.as_deref(),
                &u.password_hash,
                u.created_at
            ],
        )?;
        Ok(())
    }

    /// Emails are matched case-insensitively.
    pub fn user_by_email(&self, email: &str) -> DeskResult<Option<UserRow>> {
        self.conn
            .query_row(
                "SELECT email, role, bank, password_hash, created_at
                 FROM app_user WHERE email = ?1 COLLATE NOCASE",
                params![email],
                user_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_users(&self) -> DeskResult<Vec<UserRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT email, role, bank, password_hash, created_at
             FROM app_user ORDER BY email ASC",
        )?;
        let rows = stmt.query_map([], user_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Sessions ───────────────────────────────────────────────────

    pub fn insert_session(
        &self,
        token_hash: &str,
        email: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO session (token_hash, email, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![token_hash, email, created_at, expires_at],
        )?;
        Ok(())
    }

    /// The session owner and the session's expiry, if the token is known.
    pub fn session_user(
        &self,
        token_hash: &str,
    ) -> DeskResult<Option<(UserRow, DateTime<Utc>)>> {
        self.conn
            .query_row(
                "SELECT u.email, u.role, u.bank, u.password_hash, u.created_at, s.expires_at
                 FROM session s JOIN app_user u ON u.email = s.email
                 WHERE s.token_hash = ?1",
                params![token_hash],
                |row| Ok((user_row_mapper(row)?, row.get(5)?)),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn delete_session(&self, token_hash: &str) -> DeskResult<()> {
        self.conn.execute(
            "DELETE FROM session WHERE token_hash = ?1",
            params![token_hash],
        )?;
        Ok(())
    }

    /// Drop every session whose expiry is at or before `now`.
    pub fn delete_expired_sessions(&self, now: DateTime<Utc>) -> DeskResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM session WHERE expires_at <= ?1", params![now])?;
        Ok(removed)
    }

    pub fn session_count(&self) -> DeskResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM session", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
