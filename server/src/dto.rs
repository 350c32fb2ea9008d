//! Request and response bodies that belong to the HTTP layer only.
//! Workflow inputs (NewApplication, NewClaim, ...) come straight from core.

use chrono::{DateTime, Utc};
use ncgc_core::{compliance::CheckDetail, session::UserProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub ok: bool,
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaysPastDueRequest {
    #[serde(default)]
    pub days_past_due: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRequest {
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub is_priority_sector: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResponse {
    pub suggested_guarantee_percentage: u8,
}

/// `{ok, reason?, message, detail?}` as returned by every validator.
#[derive(Debug, Serialize)]
pub struct ValidatorResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<CheckDetail>,
}
