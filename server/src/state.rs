//! Shared server state.

use crate::error::{ApiError, ApiResult};
use ncgc_core::{DeskResult, GuaranteeDesk};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One desk per process. Handlers reach it only through `with_desk`, so the
/// lock is never held across an await.
#[derive(Clone)]
pub struct AppState {
    desk: Arc<Mutex<GuaranteeDesk>>,
    /// Artificial latency before validator answers.
    pub validator_delay: Duration,
}

impl AppState {
    pub fn new(desk: GuaranteeDesk) -> Self {
        let validator_delay = Duration::from_millis(desk.config().validator_delay_ms);
        Self {
            desk: Arc::new(Mutex::new(desk)),
            validator_delay,
        }
    }

    pub fn with_desk<T>(&self, f: impl FnOnce(&mut GuaranteeDesk) -> DeskResult<T>) -> ApiResult<T> {
        let mut desk = self
            .desk
            .lock()
            .map_err(|_| ApiError::Internal("desk lock poisoned".to_string()))?;
        f(&mut desk).map_err(ApiError::from)
    }

    /// Run Argon2 work on the blocking pool, without the desk lock.
    pub async fn off_desk<T, F>(&self, f: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> DeskResult<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| ApiError::Internal(format!("spawn_blocking failed: {e}")))?
            .map_err(ApiError::from)
    }
}
