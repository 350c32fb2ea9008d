//! Claim endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use ncgc_core::claim_workflow::{Claim, ClaimReview, NewClaim};

use crate::auth::{ApiJson, Session};
use crate::error::ApiResult;
use crate::state::AppState;

/// `POST /applications/:id/claim`
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<String>,
    ApiJson(new): ApiJson<NewClaim>,
) -> ApiResult<Json<Claim>> {
    let claim =
        state.with_desk(|desk| desk.submit_claim(&session.actor, &application_id, new))?;
    Ok(Json(claim))
}

pub async fn list(State(state): State<AppState>, session: Session) -> ApiResult<Json<Vec<Claim>>> {
    let claims = state.with_desk(|desk| desk.list_claims(&session.actor))?;
    Ok(Json(claims))
}

pub async fn get_one(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Claim>> {
    let claim = state.with_desk(|desk| desk.get_claim(&session.actor, &id))?;
    Ok(Json(claim))
}

pub async fn review(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(review): ApiJson<ClaimReview>,
) -> ApiResult<Json<Claim>> {
    let claim = state.with_desk(|desk| desk.review_claim(&session.actor, &id, review))?;
    Ok(Json(claim))
}
