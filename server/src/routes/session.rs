//! Login, logout and the caller's own profile.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use ncgc_core::session::{check_password, UserProfile};

use crate::auth::{session_token, ApiJson, Session, SESSION_COOKIE};
use crate::dto::{LoginRequest, LoginResponse, OkResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let LoginRequest { email, password } = req;
    let user = state.with_desk(|desk| desk.login_candidate(&email, &password))?;
    let user = state
        .off_desk(move || check_password(&user, &password).map(|()| user))
        .await?;
    let (grant, ttl_hours) = state.with_desk(|desk| {
        let grant = desk.open_session(&user)?;
        Ok((grant, desk.config().session_ttl_hours))
    })?;
    let max_age = ttl_hours * 3600;
    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        grant.token
    );
    let body = LoginResponse {
        success: true,
        token: grant.token,
        user: grant.user,
        expires_at: grant.expires_at,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

/// Idempotent: an unknown or already-closed session still logs out.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Ok(token) = session_token(&headers) {
        state.with_desk(|desk| desk.logout(&token))?;
    }
    let cleared = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    Ok(([(header::SET_COOKIE, cleared)], Json(OkResponse::ok())))
}

pub async fn me(session: Session) -> Json<UserProfile> {
    let actor = session.actor;
    Json(UserProfile {
        email: actor.email,
        role: actor.role,
        bank: actor.bank,
    })
}
