//! Request extractors: the caller's session and JSON bodies that fail
//! into the error envelope.

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    Json,
};
use ncgc_core::Actor;
use serde::de::DeserializeOwned;

pub const SESSION_COOKIE: &str = "ncgc_session";

/// The authenticated caller. Role and bank come from the stored session.
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: Actor,
    pub token: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|t| !t.is_empty())
}

pub fn session_token(headers: &HeaderMap) -> ApiResult<String> {
    bearer_token(headers)
        .or_else(|| cookie_token(headers))
        .ok_or(ApiError::Unauthorized)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)?;
        let actor = state.with_desk(|desk| desk.authenticate(&token))?;
        Ok(Self { actor, token })
    }
}

/// `Json<T>` whose rejections become `invalid_request`.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("ncgc_session=def"));
        assert_eq!(session_token(&headers).ok().as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; ncgc_session=def; lang=en"),
        );
        assert_eq!(session_token(&headers).ok().as_deref(), Some("def"));
    }

    #[test]
    fn no_token_is_unauthorized() {
        assert!(matches!(
            session_token(&HeaderMap::new()),
            Err(ApiError::Unauthorized)
        ));
    }
}
