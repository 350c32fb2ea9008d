//! Recovery endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use ncgc_core::{
    application_workflow::Application,
    recovery_workflow::{NewRecovery, Recovery, RecoveryUpdate},
};

use crate::auth::{ApiJson, Session};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn initiate(
    State(state): State<AppState>,
    session: Session,
    ApiJson(new): ApiJson<NewRecovery>,
) -> ApiResult<Json<Recovery>> {
    let recovery = state.with_desk(|desk| desk.initiate_recovery(&session.actor, new))?;
    Ok(Json(recovery))
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Recovery>>> {
    let recoveries = state.with_desk(|desk| desk.list_recoveries(&session.actor))?;
    Ok(Json(recoveries))
}

/// Applications that may still open a recovery.
pub async fn eligible(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Application>>> {
    let apps = state.with_desk(|desk| desk.eligible_for_recovery(&session.actor))?;
    Ok(Json(apps))
}

pub async fn get_one(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Recovery>> {
    let recovery = state.with_desk(|desk| desk.get_recovery(&session.actor, &id))?;
    Ok(Json(recovery))
}

pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<RecoveryUpdate>,
) -> ApiResult<Json<Recovery>> {
    let recovery =
        state.with_desk(|desk| desk.update_recovery_status(&session.actor, &id, update))?;
    Ok(Json(recovery))
}
