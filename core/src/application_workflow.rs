//! Application Record Service.
//!
//! States: pending_ncgc_review (initial) → Approved | Rejected.
//! Decisions are last-writer-wins until a claim is attached; from then on
//! the decision is frozen.
//!
//! The suggested guarantee is materialized lazily: the first read of an
//! application without one draws a value from the configured range and
//! persists it behind a presence guard. It never changes afterwards.

use crate::{
    claim_workflow::ClaimStatus,
    compliance::{CheckKind, CheckStatus},
    desk::{new_id, GuaranteeDesk},
    error::{DeskError, DeskResult},
    event::{DeskEvent, EventLogEntry},
    loan::{DpdGrade, LoanPosition, RepaymentSchedule},
    notification::NotificationKind,
    recovery_workflow::RecoveryRef,
    types::{require_text, Actor, Amount, EntityId, Role},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SYSTEM_AUTHOR: &str = "system";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicationStatus {
    #[serde(rename = "pending_ncgc_review")]
    PendingNcgcReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingNcgcReview => "pending_ncgc_review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> DeskResult<Self> {
        match s {
            "pending_ncgc_review" => Ok(Self::PendingNcgcReview),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(DeskError::invalid(format!("unknown application status '{other}'"))),
        }
    }
}

/// Outcome of the BVN/NIN format checks run at submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerKyc {
    pub bvn: Option<CheckStatus>,
    pub nin: Option<CheckStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub name: String,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub bvn: Option<String>,
    pub nin: Option<String>,
    pub id_document: Option<String>,
    pub kyc: OwnerKyc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOwner {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub lga: Option<String>,
    #[serde(default)]
    pub bvn: Option<String>,
    #[serde(default)]
    pub nin: Option<String>,
    #[serde(default)]
    pub id_document: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NcgcDecision {
    pub approved: bool,
    pub guarantee_percentage: Option<f64>,
    pub suggested_guarantee: Option<u32>,
    pub comments: Vec<String>,
}

/// Set when the maker submits. Reported only; no transition checks it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankSignOff {
    pub approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub author: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Back-reference mirrored from the claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRef {
    pub id: EntityId,
    pub status: ClaimStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: EntityId,
    pub bank_name: String,
    pub business_name: String,
    pub rc_number: String,
    pub tin: Option<String>,
    pub loan_amount: Amount,
    #[serde(rename = "tenure")]
    pub tenure_months: u32,
    pub purpose: String,
    pub owners: Vec<Owner>,
    pub documents: BTreeMap<String, String>,
    pub status: ApplicationStatus,
    pub ncgc: NcgcDecision,
    pub bank: BankSignOff,
    pub comments: Vec<Comment>,
    pub loan: LoanPosition,
    pub claim: Option<ClaimRef>,
    pub recovery: Option<RecoveryRef>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// round(loanAmount × guaranteePercentage / 100), once approved.
    pub fn max_claim_amount(&self) -> Option<Amount> {
        if !self.ncgc.approved {
            return None;
        }
        self.ncgc
            .guarantee_percentage
            .map(|pct| (self.loan_amount * pct / 100.0).round())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub rc_number: String,
    #[serde(default)]
    pub tin: Option<String>,
    #[serde(default)]
    pub loan_amount: Amount,
    #[serde(default, rename = "tenure")]
    pub tenure_months: u32,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub owners: Vec<NewOwner>,
    #[serde(default)]
    pub documents: BTreeMap<String, String>,
    /// Only admins name the bank; makers always submit for their own.
    #[serde(default)]
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDecision {
    #[serde(default)]
    pub guarantee_percentage: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

const DECIDERS: &[Role] = &[Role::NcgcAnalyst, Role::Admin];

impl GuaranteeDesk {
    // ── Reads ──────────────────────────────────────────────────────

    pub(crate) fn load_application(&self, id: &str) -> DeskResult<Application> {
        self.store
            .get_application(id)?
            .ok_or_else(|| DeskError::not_found("Application", id))
    }

    /// Other banks' applications look the same as missing ones.
    pub(crate) fn visible_application(&self, actor: &Actor, id: &str) -> DeskResult<Application> {
        let app = self.load_application(id)?;
        if !actor.can_see_bank(&app.bank_name) {
            return Err(DeskError::not_found("Application", id));
        }
        Ok(app)
    }

    pub fn list_applications(&self, actor: &Actor) -> DeskResult<Vec<Application>> {
        self.store.list_applications(actor.bank_scope())
    }

    /// Read one application, materializing its suggested guarantee first.
    pub fn get_application(&mut self, actor: &Actor, id: &str) -> DeskResult<Application> {
        let app = self.visible_application(actor, id)?;
        if app.ncgc.suggested_guarantee.is_some() {
            return Ok(app);
        }
        self.ensure_suggested_guarantee(id)?;
        self.load_application(id)
    }

    /// Returns the stored suggested guarantee, drawing and persisting one
    /// if the application has none yet.
    pub fn ensure_suggested_guarantee(&mut self, id: &str) -> DeskResult<u32> {
        let app = self.load_application(id)?;
        if let Some(existing) = app.ncgc.suggested_guarantee {
            return Ok(existing);
        }

        let draw = self.rng.between_inclusive(
            self.config.suggested_guarantee_min,
            self.config.suggested_guarantee_max,
        );
        let now = self.now();
        let won = self.store.transaction(|store| {
            let won = store.set_suggested_guarantee_if_absent(id, draw)?;
            if won {
                store.append_event(
                    &DeskEvent::SuggestedGuaranteeMaterialized {
                        application_id: id.to_string(),
                        suggested_guarantee: draw,
                    },
                    now,
                )?;
            }
            Ok(won)
        })?;
        if won {
            log::info!("Application {id}: suggested guarantee materialized at {draw}%");
        }

        // Re-read: if the guard lost, the earlier value stands.
        self.load_application(id)?
            .ncgc
            .suggested_guarantee
            .ok_or_else(|| anyhow::anyhow!("suggested guarantee missing after materialization").into())
    }

    pub fn application_history(&self, actor: &Actor, id: &str) -> DeskResult<Vec<EventLogEntry>> {
        self.visible_application(actor, id)?;
        self.store.events_for_application(id)
    }

    // ── Submission ─────────────────────────────────────────────────

    pub fn submit_application(
        &self,
        actor: &Actor,
        new: NewApplication,
    ) -> DeskResult<Application> {
        actor.require(&[Role::BankMaker, Role::Admin], "submit applications")?;

        let bank_name = match actor.role {
            Role::BankMaker => actor
                .bank
                .clone()
                .ok_or_else(|| DeskError::invalid("maker account has no bank"))?,
            _ => new
                .bank_name
                .clone()
                .filter(|b| !b.trim().is_empty())
                .ok_or_else(|| DeskError::invalid("bankName is required"))?,
        };

        require_text("businessName", &new.business_name)?;
        require_text("rcNumber", &new.rc_number)?;
        require_text("purpose", &new.purpose)?;
        if !new.loan_amount.is_finite() || new.loan_amount <= 0.0 {
            return Err(DeskError::invalid("loanAmount must be greater than zero"));
        }
        if new.tenure_months == 0 {
            return Err(DeskError::invalid("tenure must be at least one month"));
        }
        if new.owners.is_empty() {
            return Err(DeskError::invalid("at least one owner is required"));
        }

        let mut owners = Vec::with_capacity(new.owners.len());
        for (i, owner) in new.owners.into_iter().enumerate() {
            require_text(&format!("owners[{i}].name"), &owner.name)?;
            let bvn = self
                .compliance
                .run_optional(CheckKind::Bvn, owner.bvn.as_deref())?;
            let nin = self
                .compliance
                .run_optional(CheckKind::Nin, owner.nin.as_deref())?;
            owners.push(Owner {
                name: owner.name.trim().to_string(),
                state: owner.state,
                lga: owner.lga,
                bvn: owner.bvn,
                nin: owner.nin,
                id_document: owner.id_document,
                kyc: OwnerKyc {
                    bvn: bvn.map(|r| r.status),
                    nin: nin.map(|r| r.status),
                },
            });
        }

        let now = self.now();
        let app = Application {
            id: new_id(),
            bank_name,
            business_name: new.business_name.trim().to_string(),
            rc_number: new.rc_number.trim().to_string(),
            tin: new.tin.filter(|t| !t.trim().is_empty()),
            loan_amount: new.loan_amount,
            tenure_months: new.tenure_months,
            purpose: new.purpose.trim().to_string(),
            owners,
            documents: new.documents,
            status: ApplicationStatus::PendingNcgcReview,
            ncgc: NcgcDecision {
                approved: false,
                guarantee_percentage: None,
                suggested_guarantee: None,
                comments: Vec::new(),
            },
            bank: BankSignOff { approved: true },
            comments: Vec::new(),
            loan: LoanPosition {
                days_past_due: 0,
                grade: DpdGrade::Performing,
            },
            claim: None,
            recovery: None,
            created_by: actor.email.clone(),
            created_at: now,
            updated_at: now,
        };

        self.store.transaction(|store| {
            store.insert_application(&app)?;
            store.append_event(
                &DeskEvent::ApplicationSubmitted {
                    application_id: app.id.clone(),
                    bank_name: app.bank_name.clone(),
                    loan_amount: app.loan_amount,
                },
                now,
            )
        })?;

        log::info!(
            "Application {} submitted by {} for {} ({:.2})",
            app.id,
            actor.email,
            app.bank_name,
            app.loan_amount
        );
        Ok(app)
    }

    // ── Decisions ──────────────────────────────────────────────────

    fn ensure_decision_open(app: &Application) -> DeskResult<()> {
        if app.claim.is_some() {
            return Err(DeskError::invalid(
                "the guarantee decision is frozen once a claim is attached",
            ));
        }
        Ok(())
    }

    pub fn approve_application(
        &mut self,
        actor: &Actor,
        id: &str,
        decision: ApprovalDecision,
    ) -> DeskResult<Application> {
        actor.require(DECIDERS, "decide applications")?;
        let app = self.load_application(id)?;
        Self::ensure_decision_open(&app)?;

        let pct = match decision.guarantee_percentage {
            Some(p) if p.is_finite() && p > 0.0 && p <= 100.0 => p,
            Some(p) => {
                return Err(DeskError::invalid(format!(
                    "guaranteePercentage must be in (0, 100], got {p}"
                )))
            }
            None => f64::from(self.ensure_suggested_guarantee(id)?),
        };

        let now = self.now();
        let note = decision.comment.filter(|c| !c.trim().is_empty());
        let system_comment = Comment {
            author: SYSTEM_AUTHOR.to_string(),
            message: format!("Application approved by {} with a {pct}% guarantee", actor.email),
            timestamp: now,
        };
        self.store.transaction(|store| {
            store.record_application_decision(id, ApplicationStatus::Approved, Some(pct), now)?;
            store.append_application_comment(id, &system_comment)?;
            if let Some(note) = &note {
                store.append_ncgc_note(id, note.trim(), now)?;
            }
            store.append_event(
                &DeskEvent::ApplicationApproved {
                    application_id: id.to_string(),
                    guarantee_percentage: pct,
                    by: actor.email.clone(),
                },
                now,
            )
        })?;

        log::info!("Application {id} approved by {} at {pct}%", actor.email);
        self.notify_best_effort(
            &app.bank_name,
            NotificationKind::ApplicationApproved,
            format!("{} was approved with a {pct}% guarantee", app.business_name),
        );
        self.load_application(id)
    }

    pub fn reject_application(
        &self,
        actor: &Actor,
        id: &str,
        reason: &str,
    ) -> DeskResult<Application> {
        actor.require(DECIDERS, "decide applications")?;
        require_text("reason", reason)?;
        let app = self.load_application(id)?;
        Self::ensure_decision_open(&app)?;

        let now = self.now();
        let reason = reason.trim();
        let system_comment = Comment {
            author: SYSTEM_AUTHOR.to_string(),
            message: format!("Application rejected by {}: {reason}", actor.email),
            timestamp: now,
        };
        self.store.transaction(|store| {
            store.record_application_decision(id, ApplicationStatus::Rejected, None, now)?;
            store.append_application_comment(id, &system_comment)?;
            store.append_ncgc_note(id, reason, now)?;
            store.append_event(
                &DeskEvent::ApplicationRejected {
                    application_id: id.to_string(),
                    reason: reason.to_string(),
                    by: actor.email.clone(),
                },
                now,
            )
        })?;

        log::info!("Application {id} rejected by {}", actor.email);
        self.notify_best_effort(
            &app.bank_name,
            NotificationKind::ApplicationRejected,
            format!("{} was rejected: {reason}", app.business_name),
        );
        self.load_application(id)
    }

    // ── Comments and loan servicing ────────────────────────────────

    /// Single-row append; concurrent commenters cannot lose each other's entries.
    pub fn add_comment(&self, actor: &Actor, id: &str, message: &str) -> DeskResult<Comment> {
        require_text("message", message)?;
        self.visible_application(actor, id)?;
        let comment = Comment {
            author: actor.email.clone(),
            message: message.trim().to_string(),
            timestamp: self.now(),
        };
        self.store.append_application_comment(id, &comment)?;
        Ok(comment)
    }

    pub fn repayment_schedule(&self, actor: &Actor, id: &str) -> DeskResult<RepaymentSchedule> {
        let app = self.visible_application(actor, id)?;
        Ok(RepaymentSchedule::simulate(
            app.loan_amount,
            app.tenure_months,
            self.now().date_naive(),
            &self.config.loan_simulation,
        ))
    }

    /// Store days past due. Without an explicit value, the repayment
    /// simulation supplies it.
    pub fn record_days_past_due(
        &self,
        actor: &Actor,
        id: &str,
        days_past_due: Option<u32>,
    ) -> DeskResult<Application> {
        let days = match days_past_due {
            Some(d) => {
                self.visible_application(actor, id)?;
                d
            }
            None => self.repayment_schedule(actor, id)?.days_past_due,
        };
        let now = self.now();
        self.store.transaction(|store| {
            store.set_days_past_due(id, days, now)?;
            store.append_event(
                &DeskEvent::DaysPastDueRecorded {
                    application_id: id.to_string(),
                    days_past_due: days,
                },
                now,
            )
        })?;
        log::info!("Application {id}: days past due set to {days}");
        self.load_application(id)
    }
}
