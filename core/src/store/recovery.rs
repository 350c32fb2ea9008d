use super::{enum_column, DeskStore};
use crate::{
    error::DeskResult,
    recovery_workflow::{Milestone, Recovery, RecoveryStatus},
    types::Amount,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

const RECOVERY_COLUMNS: &str = "id, application_id, claim_id, bank_name, claim_amount,
    recovery_amount, status, created_by, created_at, updated_at";

// Milestones are filled in afterwards from recovery_milestone.
fn recovery_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Recovery> {
    Ok(Recovery {
        id: row.get(0)?,
        application_id: row.get(1)?,
        claim_id: row.get(2)?,
        bank_name: row.get(3)?,
        claim_amount: row.get(4)?,
        recovery_amount: row.get(5)?,
        status: enum_column(6, &row.get::<_, String>(6)?, RecoveryStatus::parse)?,
        milestones: Vec::new(),
        created_by: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl DeskStore {
    // ── Recovery ───────────────────────────────────────────────────

    pub fn insert_recovery(&self, r: &Recovery) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO recovery (
                id, application_id, claim_id, bank_name, claim_amount, recovery_amount,
                status, created_by, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &r.id,
                &r.application_id,
                &r.claim_id,
                &r.bank_name,
                r.claim_amount,
                r.recovery_amount,
                r.status.as_str(),
                &r.created_by,
                r.created_at,
                r.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_recovery(&self, id: &str) -> DeskResult<Option<Recovery>> {
        let sql = format!("SELECT {RECOVERY_COLUMNS} FROM recovery WHERE id = ?1");
        let found = self
            .conn
            .query_row(&sql, params![id], recovery_row_mapper)
            .optional()?;
        match found {
            Some(mut r) => {
                r.milestones = self.milestones_for(&r.id)?;
                Ok(Some(r))
            }
            None => Ok(None),
        }
    }

    pub fn list_recoveries(&self, bank: Option<&str>) -> DeskResult<Vec<Recovery>> {
        let sql = format!(
            "SELECT {RECOVERY_COLUMNS} FROM recovery
             WHERE (?1 IS NULL OR bank_name = ?1)
             ORDER BY created_at DESC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut recoveries = stmt
            .query_map(params![bank], recovery_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        for r in &mut recoveries {
            r.milestones = self.milestones_for(&r.id)?;
        }
        Ok(recoveries)
    }

    fn milestones_for(&self, recovery_id: &str) -> DeskResult<Vec<Milestone>> {
        let mut stmt = self.conn.prepare(
            "SELECT title, description, date FROM recovery_milestone
             WHERE recovery_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![recovery_id], |row| {
            Ok(Milestone {
                title: row.get(0)?,
                description: row.get(1)?,
                date: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn append_milestone(&self, recovery_id: &str, m: &Milestone) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO recovery_milestone (recovery_id, title, description, date)
             VALUES (?1, ?2, ?3, ?4)",
            params![recovery_id, &m.title, &m.description, m.date],
        )?;
        Ok(())
    }

    pub fn update_recovery_status(
        &self,
        id: &str,
        status: RecoveryStatus,
        recovery_amount: Amount,
        at: DateTime<Utc>,
    ) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE recovery SET status = ?1, recovery_amount = ?2, updated_at = ?3
             WHERE id = ?4",
            params![status.as_str(), recovery_amount, at, id],
        )?;
        Ok(())
    }

    pub fn recovery_exists_for_application(&self, application_id: &str) -> DeskResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recovery WHERE application_id = ?1",
            params![application_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }
}
