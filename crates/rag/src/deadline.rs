//! Per-call timeouts for external services.

use policybot_core::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Run `fut` with a deadline; on expiry return the error built by `on_timeout`.
pub(crate) async fn with_deadline<T, F>(
    duration: Duration,
    fut: F,
    on_timeout: impl FnOnce() -> AppError,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}
