use super::{enum_column, DeskStore};
use crate::{
    error::DeskResult,
    notification::{Notification, NotificationKind},
};
use rusqlite::params;

fn notification_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        bank_name: row.get(1)?,
        kind: enum_column(2, &row.get::<_, String>(2)?, NotificationKind::parse)?,
        message: row.get(3)?,
        created_at: row.get(4)?,
        read: row.get::<_, i32>(5)? != 0,
    })
}

impl DeskStore {
    // ── Notifications ──────────────────────────────────────────────

    pub fn insert_notification(&self, n: &Notification) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO notification (id, bank_name, kind, message, created_at, read)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &n.id,
                &n.bank_name,
                n.kind.as_str(),
                &n.message,
                n.created_at,
                if n.read { 1i32 } else { 0i32 },
            ],
        )?;
        Ok(())
    }

    pub fn list_notifications(&self, bank: Option<&str>) -> DeskResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, bank_name, kind, message, created_at, read FROM notification
             WHERE (?1 IS NULL OR bank_name = ?1)
             ORDER BY created_at DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![bank], notification_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn notification_bank(&self, id: &str) -> DeskResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT bank_name FROM notification WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
        rows.next().transpose().map_err(Into::into)
    }

    pub fn mark_notification_read(&self, id: &str) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE notification SET read = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}
