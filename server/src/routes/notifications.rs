use axum::{
    extract::{Path, State},
    Json,
};
use ncgc_core::notification::Notification;

use crate::auth::Session;
use crate::dto::OkResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = state.with_desk(|desk| desk.list_notifications(&session.actor))?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    state.with_desk(|desk| desk.mark_notification_read(&session.actor, &id))?;
    Ok(Json(OkResponse::ok()))
}
