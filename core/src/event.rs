//! Workflow event log.
//!
//! RULE: Every state transition appends exactly one DeskEvent, written in
//! the same transaction as the transition itself. The log is append-only.

use crate::types::{Amount, EntityId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Variants are added over time — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    // ── Applications ───────────────────────────────
    ApplicationSubmitted {
        application_id: EntityId,
        bank_name: String,
        loan_amount: Amount,
    },
    SuggestedGuaranteeMaterialized {
        application_id: EntityId,
        suggested_guarantee: u32,
    },
    ApplicationApproved {
        application_id: EntityId,
        guarantee_percentage: f64,
        by: String,
    },
    ApplicationRejected {
        application_id: EntityId,
        reason: String,
        by: String,
    },
    DaysPastDueRecorded {
        application_id: EntityId,
        days_past_due: u32,
    },

    // ── Claims ─────────────────────────────────────
    ClaimSubmitted {
        application_id: EntityId,
        claim_id: EntityId,
        claim_amount: Amount,
    },
    ClaimApproved {
        application_id: EntityId,
        claim_id: EntityId,
        payment_reference: String,
        amount: Amount,
    },
    ClaimRejected {
        application_id: EntityId,
        claim_id: EntityId,
        comments: String,
    },

    // ── Recoveries ─────────────────────────────────
    RecoveryInitiated {
        application_id: EntityId,
        recovery_id: EntityId,
        claim_amount: Amount,
    },
    RecoveryStatusChanged {
        application_id: EntityId,
        recovery_id: EntityId,
        old_status: String,
        new_status: String,
    },
}

impl DeskEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ApplicationSubmitted { .. }            => "application_submitted",
            Self::SuggestedGuaranteeMaterialized { .. }  => "suggested_guarantee_materialized",
            Self::ApplicationApproved { .. }             => "application_approved",
            Self::ApplicationRejected { .. }             => "application_rejected",
            Self::DaysPastDueRecorded { .. }             => "days_past_due_recorded",
            Self::ClaimSubmitted { .. }                  => "claim_submitted",
            Self::ClaimApproved { .. }                   => "claim_approved",
            Self::ClaimRejected { .. }                   => "claim_rejected",
            Self::RecoveryInitiated { .. }               => "recovery_initiated",
            Self::RecoveryStatusChanged { .. }           => "recovery_status_changed",
        }
    }

    /// The application every event belongs to. History is keyed on it.
    pub fn application_id(&self) -> &str {
        match self {
            Self::ApplicationSubmitted { application_id, .. }
            | Self::SuggestedGuaranteeMaterialized { application_id, .. }
            | Self::ApplicationApproved { application_id, .. }
            | Self::ApplicationRejected { application_id, .. }
            | Self::DaysPastDueRecorded { application_id, .. }
            | Self::ClaimSubmitted { application_id, .. }
            | Self::ClaimApproved { application_id, .. }
            | Self::ClaimRejected { application_id, .. }
            | Self::RecoveryInitiated { application_id, .. }
            | Self::RecoveryStatusChanged { application_id, .. } => application_id,
        }
    }
}

/// A row in the event_log table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub application_id: EntityId,
    pub event_type: String,
    pub payload: DeskEvent,
    pub created_at: DateTime<Utc>,
}
