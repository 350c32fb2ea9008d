use super::{enum_column, json_column, DeskStore};
use crate::{
    bank_onboarding::{Bank, BankStatus},
    error::DeskResult,
};
use rusqlite::{params, OptionalExtension};

fn bank_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bank> {
    Ok(Bank {
        id: row.get(0)?,
        name: row.get(1)?,
        cbn_license: row.get(2)?,
        rc_number: row.get(3)?,
        ndic_number: row.get(4)?,
        tin: row.get(5)?,
        address: row.get(6)?,
        contact_email: row.get(7)?,
        status: enum_column(8, &row.get::<_, String>(8)?, BankStatus::parse)?,
        checks: json_column(9, &row.get::<_, String>(9)?)?,
        onboarded_at: row.get(10)?,
    })
}

impl DeskStore {
    // ── Bank / PFI ─────────────────────────────────────────────────

    pub fn insert_bank(&self, b: &Bank) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO bank (
                id, name, cbn_license, rc_number, ndic_number, tin, address,
                contact_email, status, checks_json, onboarded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &b.id,
                &b.name,
                &b.cbn_license,
                &b.rc_number,
                &b.ndic_number,
                b.tin.as_deref(),
                b.address.as_deref(),
                &b.contact_email,
                b.status.as_str(),
                serde_json::to_string(&b.checks)?,
                b.onboarded_at,
            ],
        )?;
        Ok(())
    }

    pub fn bank_by_name(&self, name: &str) -> DeskResult<Option<Bank>> {
        self.conn
            .query_row(
                "SELECT id, name, cbn_license, rc_number, ndic_number, tin, address,
                        contact_email, status, checks_json, onboarded_at
                 FROM bank WHERE name = ?1 COLLATE NOCASE",
                params![name],
                bank_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_banks(&self) -> DeskResult<Vec<Bank>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, cbn_license, rc_number, ndic_number, tin, address,
                    contact_email, status, checks_json, onboarded_at
             FROM bank ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], bank_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
