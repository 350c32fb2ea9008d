//! PFI notifications.
//!
//! RULE: Delivery is best-effort. A failed delivery is logged and
//! swallowed; it never rolls back or fails the transition behind it.

use crate::{
    desk::{new_id, GuaranteeDesk},
    error::{DeskError, DeskResult},
    store::DeskStore,
    types::{Actor, EntityId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationApproved,
    ApplicationRejected,
    ClaimApproved,
    ClaimRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationApproved => "application_approved",
            Self::ApplicationRejected => "application_rejected",
            Self::ClaimApproved => "claim_approved",
            Self::ClaimRejected => "claim_rejected",
        }
    }

    pub fn parse(s: &str) -> DeskResult<Self> {
        match s {
            "application_approved" => Ok(Self::ApplicationApproved),
            "application_rejected" => Ok(Self::ApplicationRejected),
            "claim_approved" => Ok(Self::ClaimApproved),
            "claim_rejected" => Ok(Self::ClaimRejected),
            other => Err(DeskError::invalid(format!("unknown notification kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: EntityId,
    pub bank_name: String,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Where notifications go once a transition has committed.
pub trait NotificationSink: Send {
    fn deliver(&self, store: &DeskStore, notification: &Notification) -> DeskResult<()>;
}

/// Default sink: a row in the notification table.
pub struct StoreSink;

impl NotificationSink for StoreSink {
    fn deliver(&self, store: &DeskStore, notification: &Notification) -> DeskResult<()> {
        store.insert_notification(notification)
    }
}

impl GuaranteeDesk {
    pub(crate) fn notify_best_effort(&self, bank_name: &str, kind: NotificationKind, message: String) {
        let notification = Notification {
            id: new_id(),
            bank_name: bank_name.to_string(),
            kind,
            message,
            created_at: self.now(),
            read: false,
        };
        if let Err(e) = self.notifier.deliver(&self.store, &notification) {
            log::warn!(
                "Notification {} for {bank_name} not delivered: {e}",
                kind.as_str()
            );
        }
    }

    pub fn list_notifications(&self, actor: &Actor) -> DeskResult<Vec<Notification>> {
        self.store.list_notifications(actor.bank_scope())
    }

    pub fn mark_notification_read(&self, actor: &Actor, id: &str) -> DeskResult<()> {
        let bank = self
            .store
            .notification_bank(id)?
            .ok_or_else(|| DeskError::not_found("Notification", id))?;
        if !actor.can_see_bank(&bank) {
            return Err(DeskError::not_found("Notification", id));
        }
        self.store.mark_notification_read(id)
    }
}
