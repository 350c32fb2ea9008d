//! Shared primitive types used across the desk.

use crate::error::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};

/// A stable, unique identifier for any stored record.
pub type EntityId = String;

/// Naira amounts. Whole-naira values are expected but not enforced.
pub type Amount = f64;

/// Who may do what on the desk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// PFI staff who originate applications and claims.
    BankMaker,
    NcgcAnalyst,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankMaker => "bank_maker",
            Self::NcgcAnalyst => "ncgc_analyst",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> DeskResult<Self> {
        match s {
            "bank_maker" => Ok(Self::BankMaker),
            "ncgc_analyst" => Ok(Self::NcgcAnalyst),
            "admin" => Ok(Self::Admin),
            other => Err(DeskError::invalid(format!("unknown role '{other}'"))),
        }
    }
}

/// The authenticated caller of a desk operation.
/// Only ever built from a stored session, never from client input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub email: String,
    pub role: Role,
    pub bank: Option<String>,
}

impl Actor {
    pub fn require(&self, allowed: &[Role], action: &'static str) -> DeskResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(DeskError::Forbidden {
                role: self.role.as_str().to_string(),
                action,
            })
        }
    }

    /// PFI users only see their own bank's records.
    pub fn can_see_bank(&self, bank_name: &str) -> bool {
        match self.role {
            Role::BankMaker => self.bank.as_deref() == Some(bank_name),
            Role::NcgcAnalyst | Role::Admin => true,
        }
    }

    /// The bank filter to apply to listings, if any.
    pub fn bank_scope(&self) -> Option<&str> {
        match self.role {
            // A maker without a bank matches nothing.
            Role::BankMaker => Some(self.bank.as_deref().unwrap_or("")),
            Role::NcgcAnalyst | Role::Admin => None,
        }
    }
}

/// Rejects blank or whitespace-only required text.
pub fn require_text(field: &str, value: &str) -> DeskResult<()> {
    if value.trim().is_empty() {
        return Err(DeskError::invalid(format!("{field} is required")));
    }
    Ok(())
}
