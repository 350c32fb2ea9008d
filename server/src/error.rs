//! API error envelope: `{ok: false, reason, message}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ncgc_core::DeskError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Desk(#[from] DeskError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Missing or invalid session")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub reason: &'static str,
    pub message: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        const INVALID: (StatusCode, &str) = (StatusCode::BAD_REQUEST, "invalid_request");
        const SERVER: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "server_error");
        let ((status, reason), message) = match self {
            ApiError::BadRequest(msg) => (INVALID, msg.clone()),
            ApiError::NotFound(msg) => ((StatusCode::NOT_FOUND, "not_found"), msg.clone()),
            ApiError::Unauthorized => ((StatusCode::UNAUTHORIZED, "unauthorized"), self.to_string()),
            ApiError::Internal(_) => (SERVER, "Internal server error".to_string()),
            ApiError::Desk(e) => match e {
                DeskError::InvalidRequest(msg) => (INVALID, msg.clone()),
                DeskError::NotFound { .. } => ((StatusCode::NOT_FOUND, "not_found"), e.to_string()),
                DeskError::Unauthorized => ((StatusCode::UNAUTHORIZED, "unauthorized"), e.to_string()),
                DeskError::Forbidden { .. } => ((StatusCode::FORBIDDEN, "forbidden"), e.to_string()),
                DeskError::Database(_)
                | DeskError::Serialization(_)
                | DeskError::Credential(_)
                | DeskError::Other(_) => (SERVER, "Internal server error".to_string()),
            },
        };
        (status, reason, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason, message) = self.parts();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        }
        let body = ErrorBody {
            ok: false,
            reason,
            message,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
