//! API route handlers

pub mod applications;
pub mod banks;
pub mod claims;
pub mod compliance;
pub mod demo;
pub mod health;
pub mod notifications;
pub mod recovery;
pub mod session;

use axum::{routing::get, routing::post, Router};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Sessions
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        .route("/me", get(session::me))
        // Demo support
        .route("/seed-users", get(demo::seed_users))
        .route("/reset-demo", post(demo::reset_demo))
        // Applications
        .route(
            "/applications",
            post(applications::submit).get(applications::list),
        )
        .route("/applications/:id", get(applications::get_one))
        .route("/applications/:id/history", get(applications::history))
        .route("/applications/:id/approve", post(applications::approve))
        .route("/applications/:id/reject", post(applications::reject))
        .route("/applications/:id/comments", post(applications::add_comment))
        .route("/applications/:id/loan-dpd", post(applications::record_dpd))
        .route(
            "/applications/:id/repayment-schedule",
            get(applications::repayment_schedule),
        )
        .route("/applications/:id/claim", post(claims::submit))
        // Claims
        .route("/claims", get(claims::list))
        .route("/claims/:id", get(claims::get_one))
        .route("/claims/:id/review", post(claims::review))
        // Recovery
        .route("/recovery", post(recovery::initiate).get(recovery::list))
        .route("/recovery/eligible", get(recovery::eligible))
        .route("/recovery/:id", get(recovery::get_one))
        .route("/recovery/:id/status", post(recovery::update_status))
        // Validators and scoring
        .route("/validate/:kind", post(compliance::validate))
        .route("/kyc/:kind", post(compliance::kyc))
        .route("/scoring/guarantee", post(compliance::score_guarantee))
        // Banks
        .route("/banks/onboard", post(banks::onboard))
        .route("/banks", get(banks::list))
        // Notifications
        .route("/notifications", get(notifications::list))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .with_state(state)
}
