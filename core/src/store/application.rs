use super::{enum_column, json_column, DeskStore};
use crate::{
    application_workflow::{
        Application, ApplicationStatus, BankSignOff, ClaimRef, Comment, NcgcDecision,
    },
    claim_workflow::ClaimStatus,
    error::DeskResult,
    loan::{DpdGrade, LoanPosition},
    recovery_workflow::{RecoveryRef, RecoveryStatus},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

const APPLICATION_COLUMNS: &str = "a.id, a.bank_name, a.business_name, a.rc_number, a.tin,
    a.loan_amount, a.tenure_months, a.purpose, a.owners_json, a.documents_json,
    a.status, a.ncgc_approved, a.guarantee_percentage, a.suggested_guarantee,
    a.bank_approved, a.days_past_due, a.claim_id, a.claim_status, a.claim_reviewed_at,
    a.recovery_id, a.recovery_status, a.created_by, a.created_at, a.updated_at";

// Comment lists are filled in afterwards from their child tables.
fn application_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Application> {
    let days_past_due: u32 = row.get(15)?;
    let claim = match row.get::<_, Option<String>>(16)? {
        Some(id) => {
            let status: String = row.get(17)?;
            Some(ClaimRef {
                id,
                status: enum_column(17, &status, ClaimStatus::parse)?,
                reviewed_at: row.get(18)?,
            })
        }
        None => None,
    };
    let recovery = match row.get::<_, Option<String>>(19)? {
        Some(id) => {
            let status: String = row.get(20)?;
            Some(RecoveryRef {
                id,
                status: enum_column(20, &status, RecoveryStatus::parse)?,
            })
        }
        None => None,
    };
    Ok(Application {
        id: row.get(0)?,
        bank_name: row.get(1)?,
        business_name: row.get(2)?,
        rc_number: row.get(3)?,
        tin: row.get(4)?,
        loan_amount: row.get(5)?,
        tenure_months: row.get(6)?,
        purpose: row.get(7)?,
        owners: json_column(8, &row.get::<_, String>(8)?)?,
        documents: json_column(9, &row.get::<_, String>(9)?)?,
        status: enum_column(10, &row.get::<_, String>(10)?, ApplicationStatus::parse)?,
        ncgc: NcgcDecision {
            approved: row.get::<_, i32>(11)? != 0,
            guarantee_percentage: row.get(12)?,
            suggested_guarantee: row.get(13)?,
            comments: Vec::new(),
        },
        bank: BankSignOff {
            approved: row.get::<_, i32>(14)? != 0,
        },
        comments: Vec::new(),
        loan: LoanPosition {
            days_past_due,
            grade: DpdGrade::from_days(days_past_due),
        },
        claim,
        recovery,
        created_by: row.get(21)?,
        created_at: row.get(22)?,
        updated_at: row.get(23)?,
    })
}

impl DeskStore {
    // ── Application ────────────────────────────────────────────────

    pub fn insert_application(&self, a: &Application) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO application (
                id, bank_name, business_name, rc_number, tin, loan_amount, tenure_months,
                purpose, owners_json, documents_json, status, ncgc_approved,
                guarantee_percentage, suggested_guarantee, bank_approved, days_past_due,
                created_by, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18, ?19)",
            params![
                &a.id,
                &a.bank_name,
                &a.business_name,
                &a.rc_number,
                a.tin.as_deref(),
                a.loan_amount,
                a.tenure_months,
                &a.purpose,
                serde_json::to_string(&a.owners)?,
                serde_json::to_string(&a.documents)?,
                a.status.as_str(),
                if a.ncgc.approved { 1i32 } else { 0i32 },
                a.ncgc.guarantee_percentage,
                a.ncgc.suggested_guarantee,
                if a.bank.approved { 1i32 } else { 0i32 },
                a.loan.days_past_due,
                &a.created_by,
                a.created_at,
                a.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_application(&self, id: &str) -> DeskResult<Option<Application>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM application a WHERE a.id = ?1");
        let found = self
            .conn
            .query_row(&sql, params![id], application_row_mapper)
            .optional()?;
        match found {
            Some(mut app) => {
                self.fill_comment_lists(&mut app)?;
                Ok(Some(app))
            }
            None => Ok(None),
        }
    }

    /// Newest first. `bank` = None lists every bank.
    pub fn list_applications(&self, bank: Option<&str>) -> DeskResult<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM application a
             WHERE (?1 IS NULL OR a.bank_name = ?1)
             ORDER BY a.created_at DESC, a.id ASC"
        );
        self.collect_applications(&sql, bank)
    }

    /// Applications whose claim is approved and paid and that have no recovery yet.
    pub fn applications_eligible_for_recovery(
        &self,
        bank: Option<&str>,
    ) -> DeskResult<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM application a
             JOIN claim c ON c.id = a.claim_id
             WHERE (?1 IS NULL OR a.bank_name = ?1)
               AND a.recovery_id IS NULL
               AND c.status = 'approved'
               AND c.payment_status = 'paid'
             ORDER BY a.created_at DESC, a.id ASC"
        );
        self.collect_applications(&sql, bank)
    }

    fn collect_applications(&self, sql: &str, bank: Option<&str>) -> DeskResult<Vec<Application>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut apps = stmt
            .query_map(params![bank], application_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        for app in &mut apps {
            self.fill_comment_lists(app)?;
        }
        Ok(apps)
    }

    fn fill_comment_lists(&self, app: &mut Application) -> DeskResult<()> {
        let mut stmt = self.conn.prepare(
            "SELECT author, message, created_at FROM application_comment
             WHERE application_id = ?1 ORDER BY id ASC",
        )?;
        app.comments = stmt
            .query_map(params![&app.id], |row| {
                Ok(Comment {
                    author: row.get(0)?,
                    message: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT note FROM ncgc_note WHERE application_id = ?1 ORDER BY id ASC",
        )?;
        app.ncgc.comments = stmt
            .query_map(params![&app.id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }

    /// Guarded write: only lands when no value is stored yet.
    /// Returns true when this call materialized the value.
    pub fn set_suggested_guarantee_if_absent(&self, id: &str, value: u32) -> DeskResult<bool> {
        let changed = self.conn.execute(
            "UPDATE application SET suggested_guarantee = ?1
             WHERE id = ?2 AND suggested_guarantee IS NULL",
            params![value, id],
        )?;
        Ok(changed == 1)
    }

    pub fn record_application_decision(
        &self,
        id: &str,
        status: ApplicationStatus,
        guarantee_percentage: Option<f64>,
        at: DateTime<Utc>,
    ) -> DeskResult<()> {
        let approved = status == ApplicationStatus::Approved;
        self.conn.execute(
            "UPDATE application SET status = ?1, ncgc_approved = ?2,
             guarantee_percentage = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                status.as_str(),
                if approved { 1i32 } else { 0i32 },
                guarantee_percentage,
                at,
                id
            ],
        )?;
        Ok(())
    }

    pub fn append_application_comment(&self, id: &str, comment: &Comment) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO application_comment (application_id, author, message, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, &comment.author, &comment.message, comment.timestamp],
        )?;
        Ok(())
    }

    pub fn append_ncgc_note(&self, id: &str, note: &str, at: DateTime<Utc>) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO ncgc_note (application_id, note, created_at) VALUES (?1, ?2, ?3)",
            params![id, note, at],
        )?;
        Ok(())
    }

    pub fn set_days_past_due(&self, id: &str, days: u32, at: DateTime<Utc>) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE application SET days_past_due = ?1, updated_at = ?2 WHERE id = ?3",
            params![days, at, id],
        )?;
        Ok(())
    }

    pub fn set_claim_ref(&self, id: &str, claim: &ClaimRef, at: DateTime<Utc>) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE application SET claim_id = ?1, claim_status = ?2, claim_reviewed_at = ?3,
             updated_at = ?4 WHERE id = ?5",
            params![&claim.id, claim.status.as_str(), claim.reviewed_at, at, id],
        )?;
        Ok(())
    }

    pub fn set_recovery_ref(
        &self,
        id: &str,
        recovery: &RecoveryRef,
        at: DateTime<Utc>,
    ) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE application SET recovery_id = ?1, recovery_status = ?2, updated_at = ?3
             WHERE id = ?4",
            params![&recovery.id, recovery.status.as_str(), at, id],
        )?;
        Ok(())
    }

    pub fn application_count(&self) -> DeskResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM application", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
