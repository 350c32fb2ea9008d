//! PFI (participating financial institution) onboarding.
//!
//! RULE: A bank is Verified only when its CBN, RC and NDIC numbers all pass
//! their format checks; anything less lands it in Pending Review. The
//! bank's maker login is created in the same transaction as the bank.

use crate::{
    compliance::{CheckKind, CheckRecord},
    desk::{new_id, GuaranteeDesk},
    error::{DeskError, DeskResult},
    session::HashedPassword,
    types::{require_text, Actor, EntityId, Role},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BankStatus {
    Verified,
    #[serde(rename = "Pending Review")]
    PendingReview,
}

impl BankStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "Verified",
            Self::PendingReview => "Pending Review",
        }
    }

    pub fn parse(s: &str) -> DeskResult<Self> {
        match s {
            "Verified" => Ok(Self::Verified),
            "Pending Review" => Ok(Self::PendingReview),
            other => Err(DeskError::invalid(format!("unknown bank status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub id: EntityId,
    pub name: String,
    pub cbn_license: String,
    pub rc_number: String,
    pub ndic_number: String,
    pub tin: Option<String>,
    pub address: Option<String>,
    pub contact_email: String,
    pub status: BankStatus,
    pub checks: Vec<CheckRecord>,
    pub onboarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBank {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cbn_license: String,
    #[serde(default)]
    pub rc_number: String,
    #[serde(default)]
    pub ndic_number: String,
    #[serde(default)]
    pub tin: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub password: String,
}

impl GuaranteeDesk {
    pub fn onboard_bank(&self, actor: &Actor, new: NewBank) -> DeskResult<Bank> {
        actor.require(&[Role::Admin], "onboard banks")?;
        require_text("password", &new.password)?;
        let password = HashedPassword::new(&self.config.password_hashing, &new.password)?;
        self.onboard_bank_hashed(actor, new, password)
    }

    /// Onboard with the maker's password already hashed. `new.password` is
    /// only checked for presence.
    pub fn onboard_bank_hashed(
        &self,
        actor: &Actor,
        new: NewBank,
        password: HashedPassword,
    ) -> DeskResult<Bank> {
        actor.require(&[Role::Admin], "onboard banks")?;
        require_text("name", &new.name)?;
        require_text("cbnLicense", &new.cbn_license)?;
        require_text("rcNumber", &new.rc_number)?;
        require_text("ndicNumber", &new.ndic_number)?;
        require_text("contactEmail", &new.contact_email)?;
        require_text("password", &new.password)?;

        let name = new.name.trim().to_string();
        let email = new.contact_email.trim().to_string();
        if self.store.bank_by_name(&name)?.is_some() {
            return Err(DeskError::invalid(format!("bank '{name}' is already onboarded")));
        }
        if self.store.user_by_email(&email)?.is_some() {
            return Err(DeskError::invalid(format!("user {email} already exists")));
        }

        let results = [
            self.compliance.run(CheckKind::Cbn, &new.cbn_license)?,
            self.compliance.run(CheckKind::Rc, &new.rc_number)?,
            self.compliance.run(CheckKind::Ndic, &new.ndic_number)?,
        ];
        let status = if results.iter().all(|r| r.is_verified()) {
            BankStatus::Verified
        } else {
            BankStatus::PendingReview
        };

        let bank = Bank {
            id: new_id(),
            name,
            cbn_license: new.cbn_license.trim().to_string(),
            rc_number: new.rc_number.trim().to_string(),
            ndic_number: new.ndic_number.trim().to_string(),
            tin: new.tin.filter(|t| !t.trim().is_empty()),
            address: new.address.filter(|a| !a.trim().is_empty()),
            contact_email: email,
            status,
            checks: results.iter().map(CheckRecord::from).collect(),
            onboarded_at: self.now(),
        };

        let maker = self.new_user_row(
            &bank.contact_email,
            password,
            Role::BankMaker,
            Some(&bank.name),
        );
        self.store.transaction(|store| {
            store.insert_bank(&bank)?;
            store.insert_user(&maker)
        })?;

        log::info!(
            "Bank {} onboarded by {} as {}",
            bank.name,
            actor.email,
            bank.status.as_str()
        );
        Ok(bank)
    }

    pub fn list_banks(&self) -> DeskResult<Vec<Bank>> {
        self.store.list_banks()
    }
}
