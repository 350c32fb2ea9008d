//! Format checks standing in for registry and KYC lookups.
//!
//! Nothing here calls an external service. Each check maps an input string
//! to one of three outcomes:
//!   - verified      the format matches the registry's allow-list
//!   - needs_review  plausible input that does not match (pending_manual_review)
//!   - invalid       blank input, surfaced as DeskError::InvalidRequest
//!
//! Checks sit behind the ComplianceCheck trait so a real registry client can
//! replace a FormatCheck without touching the workflows.

use crate::error::{DeskError, DeskResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PENDING_MANUAL_REVIEW: &str = "pending_manual_review";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Cbn,
    Rc,
    Ndic,
    Tin,
    Bvn,
    Nin,
    Cac,
}

impl CheckKind {
    pub const ALL: [CheckKind; 7] = [
        Self::Cbn,
        Self::Rc,
        Self::Ndic,
        Self::Tin,
        Self::Bvn,
        Self::Nin,
        Self::Cac,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cbn => "cbn",
            Self::Rc => "rc",
            Self::Ndic => "ndic",
            Self::Tin => "tin",
            Self::Bvn => "bvn",
            Self::Nin => "nin",
            Self::Cac => "cac",
        }
    }

    pub fn parse(s: &str) -> DeskResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DeskError::invalid(format!("unknown check '{s}'")))
    }

    /// The request body field carrying the number, e.g. `bvnNumber`.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Cbn => "cbnNumber",
            Self::Rc => "rcNumber",
            Self::Ndic => "ndicNumber",
            Self::Tin => "tinNumber",
            Self::Bvn => "bvnNumber",
            Self::Nin => "ninNumber",
            Self::Cac => "cacNumber",
        }
    }

    /// Identity checks live under /kyc, institutional ones under /validate.
    pub fn is_kyc(&self) -> bool {
        matches!(self, Self::Bvn | Self::Nin | Self::Cac)
    }

    pub fn registry(&self) -> &'static str {
        match self {
            Self::Cbn => "Central Bank of Nigeria",
            Self::Rc | Self::Cac => "Corporate Affairs Commission",
            Self::Ndic => "Nigeria Deposit Insurance Corporation",
            Self::Tin => "Federal Inland Revenue Service",
            Self::Bvn => "Nigeria Inter-Bank Settlement System",
            Self::Nin => "National Identity Management Commission",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Cbn => "CBN licence",
            Self::Rc => "RC number",
            Self::Ndic => "NDIC certificate",
            Self::Tin => "TIN",
            Self::Bvn => "BVN",
            Self::Nin => "NIN",
            Self::Cac => "CAC registration",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Verified,
    NeedsReview,
}

/// Canned registry echo attached to verified results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckDetail {
    pub registry: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<CheckDetail>,
}

impl CheckResult {
    pub fn is_verified(&self) -> bool {
        self.status == CheckStatus::Verified
    }

    /// `pending_manual_review` for anything short of verified.
    pub fn reason(&self) -> Option<&'static str> {
        match self.status {
            CheckStatus::Verified => None,
            CheckStatus::NeedsReview => Some(PENDING_MANUAL_REVIEW),
        }
    }
}

/// A stored outcome: which check ran and how it came out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckRecord {
    pub kind: CheckKind,
    pub status: CheckStatus,
}

impl From<&CheckResult> for CheckRecord {
    fn from(r: &CheckResult) -> Self {
        Self {
            kind: r.kind,
            status: r.status,
        }
    }
}

pub trait ComplianceCheck: Send + Sync {
    fn kind(&self) -> CheckKind;

    /// Blank input is an error; everything else yields a result.
    fn check(&self, input: &str) -> DeskResult<CheckResult>;
}

// Format patterns (compiled once). Digits are ASCII only.

static CBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^CBN").expect("Invalid CBN regex"));

static RC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^RC[0-9]{5,8}$").expect("Invalid RC regex"));

static NDIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^NDIC").expect("Invalid NDIC regex"));

static TIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{8}-[0-9]{4}$").expect("Invalid TIN regex"));

/// BVN and NIN share the same shape.
static ELEVEN_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{11}$").expect("Invalid BVN/NIN regex"));

static CAC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(RC|BN|IT)[0-9]{1,10}$").expect("Invalid CAC regex"));

fn pattern_for(kind: CheckKind) -> &'static Regex {
    match kind {
        CheckKind::Cbn => &CBN_PATTERN,
        CheckKind::Rc => &RC_PATTERN,
        CheckKind::Ndic => &NDIC_PATTERN,
        CheckKind::Tin => &TIN_PATTERN,
        CheckKind::Bvn | CheckKind::Nin => &ELEVEN_DIGITS,
        CheckKind::Cac => &CAC_PATTERN,
    }
}

/// Keep the last four characters visible.
fn mask(s: &str) -> String {
    let n = s.chars().count();
    s.chars()
        .enumerate()
        .map(|(i, c)| if i + 4 < n { '*' } else { c })
        .collect()
}

pub struct FormatCheck {
    kind: CheckKind,
    pattern: &'static Regex,
}

impl FormatCheck {
    pub fn for_kind(kind: CheckKind) -> Self {
        Self {
            kind,
            pattern: pattern_for(kind),
        }
    }
}

impl ComplianceCheck for FormatCheck {
    fn kind(&self) -> CheckKind {
        self.kind
    }

    fn check(&self, input: &str) -> DeskResult<CheckResult> {
        let value = input.trim();
        if value.is_empty() {
            return Err(DeskError::invalid(format!(
                "{} is required",
                self.kind.field_name()
            )));
        }

        let label = self.kind.label();
        let result = if self.pattern.is_match(value) {
            CheckResult {
                kind: self.kind,
                status: CheckStatus::Verified,
                message: format!("{label} verified"),
                detail: Some(CheckDetail {
                    registry: self.kind.registry().to_string(),
                    reference: mask(value),
                }),
            }
        } else {
            CheckResult {
                kind: self.kind,
                status: CheckStatus::NeedsReview,
                message: format!("{label} could not be verified automatically; queued for manual review"),
                detail: None,
            }
        };
        log::debug!("{} check -> {:?}", self.kind.as_str(), result.status);
        Ok(result)
    }
}

/// One check per kind. Starts with the format checks; `register` swaps one out.
pub struct ComplianceRegistry {
    checks: HashMap<CheckKind, Box<dyn ComplianceCheck>>,
}

impl ComplianceRegistry {
    pub fn with_format_checks() -> Self {
        let mut registry = Self {
            checks: HashMap::new(),
        };
        for kind in CheckKind::ALL {
            registry.register(Box::new(FormatCheck::for_kind(kind)));
        }
        registry
    }

    pub fn register(&mut self, check: Box<dyn ComplianceCheck>) {
        self.checks.insert(check.kind(), check);
    }

    pub fn run(&self, kind: CheckKind, input: &str) -> DeskResult<CheckResult> {
        let check = self
            .checks
            .get(&kind)
            .ok_or_else(|| DeskError::invalid(format!("no check registered for '{}'", kind.as_str())))?;
        check.check(input)
    }

    /// Like `run`, but blank input yields None instead of an error.
    pub fn run_optional(&self, kind: CheckKind, input: Option<&str>) -> DeskResult<Option<CheckResult>> {
        match input {
            Some(s) if !s.trim().is_empty() => self.run(kind, s).map(Some),
            _ => Ok(None),
        }
    }
}

impl Default for ComplianceRegistry {
    fn default() -> Self {
        Self::with_format_checks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(kind: CheckKind, input: &str) -> CheckStatus {
        ComplianceRegistry::with_format_checks()
            .run(kind, input)
            .unwrap()
            .status
    }

    #[test]
    fn bvn_and_nin_need_eleven_digits() {
        assert_eq!(run(CheckKind::Bvn, "22212345678"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Nin, "12345678901"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Bvn, "2221234567"), CheckStatus::NeedsReview);
        assert_eq!(run(CheckKind::Bvn, "2221234567X"), CheckStatus::NeedsReview);
    }

    #[test]
    fn embedded_whitespace_is_not_stripped() {
        assert_eq!(run(CheckKind::Bvn, "222 123 45678"), CheckStatus::NeedsReview);
        assert_eq!(run(CheckKind::Nin, "123456\t78901"), CheckStatus::NeedsReview);
        assert_eq!(run(CheckKind::Tin, "12345678 -0001"), CheckStatus::NeedsReview);
        // Surrounding whitespace is trimmed.
        assert_eq!(run(CheckKind::Bvn, "  22212345678\n"), CheckStatus::Verified);
    }

    #[test]
    fn institutional_prefixes() {
        assert_eq!(run(CheckKind::Cbn, "CBN/MFB/2021/001"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Cbn, "cbn-123"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Cbn, "LIC-123"), CheckStatus::NeedsReview);
        assert_eq!(run(CheckKind::Ndic, "NDIC/2020/44"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Rc, "RC123456"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Rc, "rc123456"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Rc, "RC 123456"), CheckStatus::NeedsReview);
        assert_eq!(run(CheckKind::Rc, "RC12"), CheckStatus::NeedsReview);
    }

    #[test]
    fn tin_and_cac_formats() {
        assert_eq!(run(CheckKind::Tin, "12345678-0001"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Tin, "123456780001"), CheckStatus::NeedsReview);
        assert_eq!(run(CheckKind::Cac, "BN998877"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Cac, "IT12"), CheckStatus::Verified);
        assert_eq!(run(CheckKind::Cac, "LLC12"), CheckStatus::NeedsReview);
    }

    #[test]
    fn blank_input_is_invalid() {
        let registry = ComplianceRegistry::with_format_checks();
        let err = registry.run(CheckKind::Bvn, "   ").unwrap_err();
        assert!(matches!(err, DeskError::InvalidRequest(_)));
        assert!(registry.run_optional(CheckKind::Bvn, Some(" ")).unwrap().is_none());
    }

    #[test]
    fn verified_detail_masks_the_number() {
        let result = ComplianceRegistry::with_format_checks()
            .run(CheckKind::Bvn, "22212345678")
            .unwrap();
        let detail = result.detail.as_ref().unwrap();
        assert_eq!(detail.reference, "*******5678");
        assert_eq!(result.reason(), None);
    }

    struct AlwaysReview;

    impl ComplianceCheck for AlwaysReview {
        fn kind(&self) -> CheckKind {
            CheckKind::Cbn
        }

        fn check(&self, _input: &str) -> DeskResult<CheckResult> {
            Ok(CheckResult {
                kind: CheckKind::Cbn,
                status: CheckStatus::NeedsReview,
                message: "registry offline".into(),
                detail: None,
            })
        }
    }

    #[test]
    fn registered_check_replaces_format_check() {
        let mut registry = ComplianceRegistry::with_format_checks();
        registry.register(Box::new(AlwaysReview));
        let result = registry.run(CheckKind::Cbn, "CBN-1").unwrap();
        assert_eq!(result.reason(), Some(PENDING_MANUAL_REVIEW));
    }
}
