//! Claim Record Service.
//!
//! States: pending_review (initial) → approved | rejected (terminal).
//! A claim may only be filed against an NCGC-approved application and may
//! not exceed the guaranteed share of the loan. Approval synthesizes the
//! payment and mirrors the claim status onto the application in one
//! transaction.

use crate::{
    application_workflow::ClaimRef,
    desk::{new_id, GuaranteeDesk},
    error::{DeskError, DeskResult},
    event::DeskEvent,
    notification::NotificationKind,
    types::{require_text, Actor, Amount, EntityId, Role},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    PendingReview,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> DeskResult<Self> {
        match s {
            "pending_review" => Ok(Self::PendingReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(DeskError::invalid(format!("unknown claim status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> DeskResult<Self> {
        match s {
            "paid" => Ok(Self::Paid),
            other => Err(DeskError::invalid(format!("unknown payment status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub amount: Amount,
    pub status: PaymentStatus,
    pub payment_reference: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: EntityId,
    pub application_id: EntityId,
    pub bank_name: String,
    pub claim_amount: Amount,
    pub outstanding_principal: Amount,
    pub outstanding_interest: Amount,
    pub default_date: NaiveDate,
    pub default_reason: String,
    pub status: ClaimStatus,
    pub review_comments: Option<String>,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClaim {
    #[serde(default)]
    pub claim_amount: Option<Amount>,
    #[serde(default)]
    pub outstanding_principal: Option<Amount>,
    #[serde(default)]
    pub outstanding_interest: Option<Amount>,
    #[serde(default)]
    pub default_date: Option<NaiveDate>,
    #[serde(default)]
    pub default_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReview {
    pub action: ReviewAction,
    #[serde(default)]
    pub comments: Option<String>,
}

/// `PAY-<unix millis>-<first 8 chars of the claim id>`.
pub fn payment_reference(at: DateTime<Utc>, claim_id: &str) -> String {
    let short: String = claim_id.chars().take(8).collect();
    format!("PAY-{}-{}", at.timestamp_millis(), short)
}

fn non_negative(field: &str, value: Option<Amount>) -> DeskResult<Amount> {
    match value {
        None => Ok(0.0),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(DeskError::invalid(format!("{field} must be zero or more, got {v}"))),
    }
}

impl GuaranteeDesk {
    pub(crate) fn load_claim(&self, id: &str) -> DeskResult<Claim> {
        self.store
            .get_claim(id)?
            .ok_or_else(|| DeskError::not_found("Claim", id))
    }

    pub fn get_claim(&self, actor: &Actor, id: &str) -> DeskResult<Claim> {
        let claim = self.load_claim(id)?;
        if !actor.can_see_bank(&claim.bank_name) {
            return Err(DeskError::not_found("Claim", id));
        }
        Ok(claim)
    }

    pub fn list_claims(&self, actor: &Actor) -> DeskResult<Vec<Claim>> {
        self.store.list_claims(actor.bank_scope())
    }

    pub fn submit_claim(
        &self,
        actor: &Actor,
        application_id: &str,
        new: NewClaim,
    ) -> DeskResult<Claim> {
        actor.require(&[Role::BankMaker, Role::Admin], "submit claims")?;
        let app = self.visible_application(actor, application_id)?;

        if !app.ncgc.approved {
            return Err(DeskError::invalid(
                "claims can only be filed against NCGC-approved applications",
            ));
        }
        let max = app
            .max_claim_amount()
            .ok_or_else(|| DeskError::invalid("application has no guarantee percentage"))?;

        let claim_amount = match new.claim_amount {
            Some(a) if a.is_finite() && a > 0.0 => a,
            Some(_) => return Err(DeskError::invalid("claimAmount must be greater than zero")),
            None => return Err(DeskError::invalid("claimAmount is required")),
        };
        let default_date = new
            .default_date
            .ok_or_else(|| DeskError::invalid("defaultDate is required"))?;
        let default_reason = new.default_reason.unwrap_or_default();
        require_text("defaultReason", &default_reason)?;

        let now = self.now();
        if default_date > now.date_naive() {
            return Err(DeskError::invalid("defaultDate cannot be in the future"));
        }
        if claim_amount > max {
            return Err(DeskError::invalid(format!(
                "claimAmount {claim_amount} exceeds the guaranteed maximum of {max}"
            )));
        }
        if let Some(existing) = &app.claim {
            if existing.status != ClaimStatus::Rejected {
                return Err(DeskError::invalid(format!(
                    "application already has a {} claim",
                    existing.status.as_str()
                )));
            }
        }

        let claim = Claim {
            id: new_id(),
            application_id: app.id.clone(),
            bank_name: app.bank_name.clone(),
            claim_amount,
            outstanding_principal: non_negative("outstandingPrincipal", new.outstanding_principal)?,
            outstanding_interest: non_negative("outstandingInterest", new.outstanding_interest)?,
            default_date,
            default_reason: default_reason.trim().to_string(),
            status: ClaimStatus::PendingReview,
            review_comments: None,
            submitted_by: actor.email.clone(),
            submitted_at: now,
            reviewed_by: None,
            reviewed_at: None,
            payment: None,
        };

        self.store.transaction(|store| {
            store.insert_claim(&claim)?;
            store.set_claim_ref(
                &claim.application_id,
                &ClaimRef {
                    id: claim.id.clone(),
                    status: claim.status,
                    reviewed_at: None,
                },
                now,
            )?;
            store.append_event(
                &DeskEvent::ClaimSubmitted {
                    application_id: claim.application_id.clone(),
                    claim_id: claim.id.clone(),
                    claim_amount,
                },
                now,
            )
        })?;

        log::info!(
            "Claim {} filed on application {} for {claim_amount:.2} (max {max:.2})",
            claim.id,
            claim.application_id
        );
        Ok(claim)
    }

    pub fn review_claim(&self, actor: &Actor, id: &str, review: ClaimReview) -> DeskResult<Claim> {
        actor.require(&[Role::NcgcAnalyst, Role::Admin], "review claims")?;
        let claim = self.load_claim(id)?;
        if claim.status != ClaimStatus::PendingReview {
            return Err(DeskError::invalid(format!(
                "claim has already been {}",
                claim.status.as_str()
            )));
        }

        let now = self.now();
        let comments = review
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        match review.action {
            ReviewAction::Approve => {
                let payment = Payment {
                    amount: claim.claim_amount,
                    status: PaymentStatus::Paid,
                    payment_reference: payment_reference(now, &claim.id),
                    paid_at: now,
                };
                self.store.transaction(|store| {
                    store.record_claim_review(
                        id,
                        ClaimStatus::Approved,
                        &actor.email,
                        now,
                        comments.as_deref(),
                        Some(&payment),
                    )?;
                    store.set_claim_ref(
                        &claim.application_id,
                        &ClaimRef {
                            id: claim.id.clone(),
                            status: ClaimStatus::Approved,
                            reviewed_at: Some(now),
                        },
                        now,
                    )?;
                    store.append_event(
                        &DeskEvent::ClaimApproved {
                            application_id: claim.application_id.clone(),
                            claim_id: claim.id.clone(),
                            payment_reference: payment.payment_reference.clone(),
                            amount: payment.amount,
                        },
                        now,
                    )
                })?;
                log::info!(
                    "Claim {id} approved by {}; paid {:.2} as {}",
                    actor.email,
                    payment.amount,
                    payment.payment_reference
                );
                self.notify_best_effort(
                    &claim.bank_name,
                    NotificationKind::ClaimApproved,
                    format!(
                        "Claim {} approved; {:.2} paid under {}",
                        claim.id, payment.amount, payment.payment_reference
                    ),
                );
            }
            ReviewAction::Reject => {
                let comments = comments
                    .ok_or_else(|| DeskError::invalid("comments are required to reject a claim"))?;
                self.store.transaction(|store| {
                    store.record_claim_review(
                        id,
                        ClaimStatus::Rejected,
                        &actor.email,
                        now,
                        Some(&comments),
                        None,
                    )?;
                    store.set_claim_ref(
                        &claim.application_id,
                        &ClaimRef {
                            id: claim.id.clone(),
                            status: ClaimStatus::Rejected,
                            reviewed_at: Some(now),
                        },
                        now,
                    )?;
                    store.append_event(
                        &DeskEvent::ClaimRejected {
                            application_id: claim.application_id.clone(),
                            claim_id: claim.id.clone(),
                            comments: comments.clone(),
                        },
                        now,
                    )
                })?;
                log::info!("Claim {id} rejected by {}", actor.email);
                self.notify_best_effort(
                    &claim.bank_name,
                    NotificationKind::ClaimRejected,
                    format!("Claim {} rejected: {comments}", claim.id),
                );
            }
        }

        self.load_claim(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payment_reference_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let r = payment_reference(at, "0a1b2c3d-4e5f-6789-abcd-ef0123456789");
        assert_eq!(r, format!("PAY-{}-0a1b2c3d", at.timestamp_millis()));
    }
}
