use super::{enum_column, DeskStore};
use crate::{
    claim_workflow::{Claim, ClaimStatus, Payment, PaymentStatus},
    error::DeskResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

const CLAIM_COLUMNS: &str = "id, application_id, bank_name, claim_amount,
    outstanding_principal, outstanding_interest, default_date, default_reason, status,
    review_comments, submitted_by, submitted_at, reviewed_by, reviewed_at,
    payment_amount, payment_status, payment_reference, paid_at";

fn claim_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Claim> {
    let payment = match row.get::<_, Option<String>>(16)? {
        Some(payment_reference) => {
            let status: String = row.get(15)?;
            Some(Payment {
                amount: row.get(14)?,
                status: enum_column(15, &status, PaymentStatus::parse)?,
                payment_reference,
                paid_at: row.get(17)?,
            })
        }
        None => None,
    };
    Ok(Claim {
        id: row.get(0)?,
        application_id: row.get(1)?,
        bank_name: row.get(2)?,
        claim_amount: row.get(3)?,
        outstanding_principal: row.get(4)?,
        outstanding_interest: row.get(5)?,
        default_date: row.get(6)?,
        default_reason: row.get(7)?,
        status: enum_column(8, &row.get::<_, String>(8)?, ClaimStatus::parse)?,
        review_comments: row.get(9)?,
        submitted_by: row.get(10)?,
        submitted_at: row.get(11)?,
        reviewed_by: row.get(12)?,
        reviewed_at: row.get(13)?,
        payment,
    })
}

impl DeskStore {
    // ── Claim ──────────────────────────────────────────────────────

    pub fn insert_claim(&self, c: &Claim) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO claim (
                id, application_id, bank_name, claim_amount, outstanding_principal,
                outstanding_interest, default_date, default_reason, status,
                review_comments, submitted_by, submitted_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                &c.id,
                &c.application_id,
                &c.bank_name,
                c.claim_amount,
                c.outstanding_principal,
                c.outstanding_interest,
                c.default_date,
                &c.default_reason,
                c.status.as_str(),
                c.review_comments.as_deref(),
                &c.submitted_by,
                c.submitted_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_claim(&self, id: &str) -> DeskResult<Option<Claim>> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claim WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], claim_row_mapper)
            .optional()
            .map_err(Into::into)
    }

    /// Newest first. `bank` = None lists every bank.
    pub fn list_claims(&self, bank: Option<&str>) -> DeskResult<Vec<Claim>> {
        let sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM claim
             WHERE (?1 IS NULL OR bank_name = ?1)
             ORDER BY submitted_at DESC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![bank], claim_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn record_claim_review(
        &self,
        id: &str,
        status: ClaimStatus,
        reviewed_by: &str,
        reviewed_at: DateTime<Utc>,
        comments: Option<&str>,
        payment: Option<&Payment>,
    ) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE claim SET status = ?1, reviewed_by = ?2, reviewed_at = ?3,
             review_comments = ?4, payment_amount = ?5, payment_status = ?6,
             payment_reference = ?7, paid_at = ?8
             WHERE id = ?9",
            params![
                status.as_str(),
                reviewed_by,
                reviewed_at,
                comments,
                payment.map(|p| p.amount),
                payment.map(|p| p.status.as_str()),
                payment.map(|p| p.payment_reference.as_str()),
                payment.map(|p| p.paid_at),
                id,
            ],
        )?;
        Ok(())
    }
}
