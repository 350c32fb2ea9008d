//! Recovery Record Service.
//!
//! States: initiated → in_progress → completed | closed.
//! RULES:
//!   - One recovery per application, opened only after the claim was
//!     approved and paid.
//!   - completed and closed are terminal.
//!   - Milestones are append-only.

use crate::{
    application_workflow::Application,
    claim_workflow::{ClaimStatus, PaymentStatus},
    desk::{new_id, GuaranteeDesk},
    error::{DeskError, DeskResult},
    event::DeskEvent,
    types::{Actor, Amount, EntityId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    Initiated,
    InProgress,
    Completed,
    Closed,
}

impl RecoveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> DeskResult<Self> {
        match s {
            "initiated" => Ok(Self::Initiated),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "closed" => Ok(Self::Closed),
            other => Err(DeskError::invalid(format!("unknown recovery status '{other}'"))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }

    /// Staying put is only allowed while the recovery is still open.
    pub fn can_move_to(&self, next: RecoveryStatus) -> bool {
        use RecoveryStatus::*;
        matches!(
            (self, next),
            (Initiated, Initiated)
                | (Initiated, InProgress)
                | (InProgress, InProgress)
                | (InProgress, Completed)
                | (InProgress, Closed)
        )
    }
}

/// Back-reference kept on the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRef {
    pub id: EntityId,
    pub status: RecoveryStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recovery {
    pub id: EntityId,
    pub application_id: EntityId,
    pub claim_id: EntityId,
    pub bank_name: String,
    pub claim_amount: Amount,
    pub recovery_amount: Amount,
    pub status: RecoveryStatus,
    pub milestones: Vec<Milestone>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecovery {
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recovery_amount: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryUpdate {
    pub status: RecoveryStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recovery_amount: Option<Amount>,
}

fn check_recovery_amount(amount: Amount, claim_amount: Amount) -> DeskResult<Amount> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(DeskError::invalid("recoveryAmount must be zero or more"));
    }
    if amount > claim_amount {
        return Err(DeskError::invalid(format!(
            "recoveryAmount {amount} exceeds the claim amount of {claim_amount}"
        )));
    }
    Ok(amount)
}

fn non_blank(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

impl GuaranteeDesk {
    fn load_recovery(&self, id: &str) -> DeskResult<Recovery> {
        self.store
            .get_recovery(id)?
            .ok_or_else(|| DeskError::not_found("Recovery", id))
    }

    pub fn get_recovery(&self, actor: &Actor, id: &str) -> DeskResult<Recovery> {
        let recovery = self.load_recovery(id)?;
        if !actor.can_see_bank(&recovery.bank_name) {
            return Err(DeskError::not_found("Recovery", id));
        }
        Ok(recovery)
    }

    pub fn list_recoveries(&self, actor: &Actor) -> DeskResult<Vec<Recovery>> {
        self.store.list_recoveries(actor.bank_scope())
    }

    /// Applications with an approved, paid claim and no recovery yet.
    pub fn eligible_for_recovery(&self, actor: &Actor) -> DeskResult<Vec<Application>> {
        self.store.applications_eligible_for_recovery(actor.bank_scope())
    }

    pub fn initiate_recovery(&self, actor: &Actor, new: NewRecovery) -> DeskResult<Recovery> {
        if new.application_id.trim().is_empty() {
            return Err(DeskError::invalid("applicationId is required"));
        }
        let app = self.visible_application(actor, new.application_id.trim())?;

        let claim_ref = app
            .claim
            .as_ref()
            .ok_or_else(|| DeskError::invalid("application has no claim"))?;
        let claim = self.load_claim(&claim_ref.id)?;
        let paid = claim
            .payment
            .as_ref()
            .map(|p| p.status == PaymentStatus::Paid)
            .unwrap_or(false);
        if claim.status != ClaimStatus::Approved || !paid {
            return Err(DeskError::invalid(
                "recovery requires an approved and paid claim",
            ));
        }
        if app.recovery.is_some() || self.store.recovery_exists_for_application(&app.id)? {
            return Err(DeskError::invalid("recovery already initiated for this application"));
        }

        let recovery_amount = match new.recovery_amount {
            Some(a) => check_recovery_amount(a, claim.claim_amount)?,
            None => 0.0,
        };
        let now = self.now();
        let first = Milestone {
            title: "Recovery initiated".to_string(),
            description: non_blank(new.notes)
                .unwrap_or_else(|| format!("Recovery opened by {}", actor.email)),
            date: now,
        };
        let mut recovery = Recovery {
            id: new_id(),
            application_id: app.id.clone(),
            claim_id: claim.id.clone(),
            bank_name: app.bank_name.clone(),
            claim_amount: claim.claim_amount,
            recovery_amount,
            status: RecoveryStatus::Initiated,
            milestones: Vec::new(),
            created_by: actor.email.clone(),
            created_at: now,
            updated_at: now,
        };

        self.store.transaction(|store| {
            store.insert_recovery(&recovery)?;
            store.append_milestone(&recovery.id, &first)?;
            store.set_recovery_ref(
                &app.id,
                &RecoveryRef {
                    id: recovery.id.clone(),
                    status: RecoveryStatus::Initiated,
                },
                now,
            )?;
            store.append_event(
                &DeskEvent::RecoveryInitiated {
                    application_id: app.id.clone(),
                    recovery_id: recovery.id.clone(),
                    claim_amount: recovery.claim_amount,
                },
                now,
            )
        })?;
        recovery.milestones.push(first);

        log::info!(
            "Recovery {} initiated on application {} by {}",
            recovery.id,
            app.id,
            actor.email
        );
        Ok(recovery)
    }

    pub fn update_recovery_status(
        &self,
        actor: &Actor,
        id: &str,
        update: RecoveryUpdate,
    ) -> DeskResult<Recovery> {
        let current = self.get_recovery(actor, id)?;
        if current.status.is_terminal() {
            return Err(DeskError::invalid(format!(
                "recovery is {} and can no longer change",
                current.status.as_str()
            )));
        }
        if !current.status.can_move_to(update.status) {
            return Err(DeskError::invalid(format!(
                "cannot move recovery from {} to {}",
                current.status.as_str(),
                update.status.as_str()
            )));
        }

        let notes = non_blank(update.notes);
        let recovery_amount = match update.recovery_amount {
            Some(a) => check_recovery_amount(a, current.claim_amount)?,
            None => current.recovery_amount,
        };
        if update.status == current.status {
            if current.status == RecoveryStatus::Initiated
                && (notes.is_none() || update.recovery_amount.is_some())
            {
                return Err(DeskError::invalid("an initiated recovery only accepts notes"));
            }
            if notes.is_none() && update.recovery_amount.is_none() {
                return Err(DeskError::invalid(
                    "a same-status update needs notes or a recoveryAmount",
                ));
            }
        }

        let now = self.now();
        self.store.transaction(|store| {
            store.update_recovery_status(id, update.status, recovery_amount, now)?;
            if let Some(note) = &notes {
                store.append_milestone(
                    id,
                    &Milestone {
                        title: format!("Status: {}", update.status.as_str()),
                        description: note.clone(),
                        date: now,
                    },
                )?;
            }
            store.set_recovery_ref(
                &current.application_id,
                &RecoveryRef {
                    id: current.id.clone(),
                    status: update.status,
                },
                now,
            )?;
            if update.status != current.status {
                store.append_event(
                    &DeskEvent::RecoveryStatusChanged {
                        application_id: current.application_id.clone(),
                        recovery_id: current.id.clone(),
                        old_status: current.status.as_str().to_string(),
                        new_status: update.status.as_str().to_string(),
                    },
                    now,
                )?;
            }
            Ok(())
        })?;

        log::info!(
            "Recovery {id}: {} -> {} by {}",
            current.status.as_str(),
            update.status.as_str(),
            actor.email
        );
        self.load_recovery(id)
    }
}
