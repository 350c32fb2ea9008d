//! PFI onboarding endpoints

use axum::{extract::State, Json};
use ncgc_core::bank_onboarding::{Bank, NewBank};
use ncgc_core::session::HashedPassword;
use ncgc_core::types::require_text;
use ncgc_core::Role;

use crate::auth::{ApiJson, Session};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn onboard(
    State(state): State<AppState>,
    session: Session,
    ApiJson(new): ApiJson<NewBank>,
) -> ApiResult<Json<Bank>> {
    let cost = state.with_desk(|desk| {
        session.actor.require(&[Role::Admin], "onboard banks")?;
        require_text("password", &new.password)?;
        Ok(desk.config().password_hashing.clone())
    })?;
    let raw = new.password.clone();
    let password = state
        .off_desk(move || HashedPassword::new(&cost, &raw))
        .await?;
    let bank = state.with_desk(|desk| desk.onboard_bank_hashed(&session.actor, new, password))?;
    Ok(Json(bank))
}

pub async fn list(State(state): State<AppState>, _session: Session) -> ApiResult<Json<Vec<Bank>>> {
    let banks = state.with_desk(|desk| desk.list_banks())?;
    Ok(Json(banks))
}
