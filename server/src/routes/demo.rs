//! Demo helpers: seeded logins and a full reset.

use axum::{extract::State, Json};
use ncgc_core::demo::hash_seed_passwords;
use ncgc_core::session::UserProfile;
use ncgc_core::Role;

use crate::auth::Session;
use crate::dto::ResetResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Ensures the demo users exist and lists them, without passwords.
pub async fn seed_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = state.with_desk(|desk| desk.seed_users())?;
    Ok(Json(users))
}

pub async fn reset_demo(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<ResetResponse>> {
    let config = state.with_desk(|desk| {
        session.actor.require(&[Role::Admin], "reset the demo")?;
        Ok(desk.config().clone())
    })?;
    let passwords = state.off_desk(move || hash_seed_passwords(&config)).await?;
    let users = state.with_desk(|desk| desk.reset_demo_hashed(&session.actor, passwords))?;
    Ok(Json(ResetResponse { ok: true, users }))
}
