//! Application endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use ncgc_core::{
    application_workflow::{Application, ApprovalDecision, Comment, NewApplication},
    event::EventLogEntry,
    loan::RepaymentSchedule,
};

use crate::auth::{ApiJson, Session};
use crate::dto::{CommentRequest, DaysPastDueRequest, RejectRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    ApiJson(new): ApiJson<NewApplication>,
) -> ApiResult<Json<Application>> {
    let app = state.with_desk(|desk| desk.submit_application(&session.actor, new))?;
    Ok(Json(app))
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Application>>> {
    let apps = state.with_desk(|desk| desk.list_applications(&session.actor))?;
    Ok(Json(apps))
}

/// The first read materializes the suggested guarantee.
pub async fn get_one(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Application>> {
    let app = state.with_desk(|desk| desk.get_application(&session.actor, &id))?;
    Ok(Json(app))
}

pub async fn history(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<EventLogEntry>>> {
    let events = state.with_desk(|desk| desk.application_history(&session.actor, &id))?;
    Ok(Json(events))
}

pub async fn approve(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(decision): ApiJson<ApprovalDecision>,
) -> ApiResult<Json<Application>> {
    let app = state.with_desk(|desk| desk.approve_application(&session.actor, &id, decision))?;
    Ok(Json(app))
}

pub async fn reject(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RejectRequest>,
) -> ApiResult<Json<Application>> {
    let app = state.with_desk(|desk| desk.reject_application(&session.actor, &id, &req.reason))?;
    Ok(Json(app))
}

pub async fn add_comment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    let comment = state.with_desk(|desk| desk.add_comment(&session.actor, &id, &req.message))?;
    Ok(Json(comment))
}

pub async fn record_dpd(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<DaysPastDueRequest>,
) -> ApiResult<Json<Application>> {
    let app = state
        .with_desk(|desk| desk.record_days_past_due(&session.actor, &id, req.days_past_due))?;
    Ok(Json(app))
}

pub async fn repayment_schedule(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<RepaymentSchedule>> {
    let schedule = state.with_desk(|desk| desk.repayment_schedule(&session.actor, &id))?;
    Ok(Json(schedule))
}
