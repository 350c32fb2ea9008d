//! Format validators, KYC checks and the guarantee scoring preview.
//!
//! Validators answer 200 with `ok: false, reason: "pending_manual_review"`
//! when a number does not verify; only missing or non-string input is a 400.

use axum::{
    extract::{Path, State},
    Json,
};
use ncgc_core::{compliance::CheckKind, scoring};
use serde_json::Value;

use crate::auth::{ApiJson, Session};
use crate::dto::{ScoringRequest, ScoringResponse, ValidatorResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn validate(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<ValidatorResponse>> {
    run_check(&state, &kind, false, &body).await
}

pub async fn kyc(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<ValidatorResponse>> {
    run_check(&state, &kind, true, &body).await
}

async fn run_check(
    state: &AppState,
    kind: &str,
    kyc: bool,
    body: &Value,
) -> ApiResult<Json<ValidatorResponse>> {
    let kind = CheckKind::parse(kind)
        .ok()
        .filter(|k| k.is_kyc() == kyc)
        .ok_or_else(|| ApiError::NotFound(format!("no validator named '{kind}'")))?;
    let field = kind.field_name();
    let input = match body.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(ApiError::BadRequest(format!("{field} must be a string"))),
        None => return Err(ApiError::BadRequest(format!("{field} is required"))),
    };

    if !state.validator_delay.is_zero() {
        tokio::time::sleep(state.validator_delay).await;
    }

    let result = state.with_desk(|desk| desk.compliance().run(kind, &input))?;
    Ok(Json(ValidatorResponse {
        ok: result.is_verified(),
        reason: result.reason(),
        message: result.message,
        detail: result.detail,
    }))
}

/// Informational preview. Independent of an application's stored
/// suggested guarantee.
pub async fn score_guarantee(
    _session: Session,
    ApiJson(req): ApiJson<ScoringRequest>,
) -> ApiResult<Json<ScoringResponse>> {
    let risk_score = req
        .risk_score
        .ok_or_else(|| ApiError::BadRequest("riskScore is required".to_string()))?;
    let pct = scoring::score_checked(risk_score, req.is_priority_sector)?;
    Ok(Json(ScoringResponse {
        suggested_guarantee_percentage: pct,
    }))
}
