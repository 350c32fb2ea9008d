//! NCGC desk HTTP API.
//!
//! Every route except `/health`, `/login`, `/logout`, `/seed-users` and the
//! validators needs a session: `Authorization: Bearer <token>` or the
//! `ncgc_session` cookie set by `/login`. Errors use the envelope
//! `{ok: false, reason, message}`.

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
