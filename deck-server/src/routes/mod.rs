pub mod community;
pub mod decks;
pub mod health;
pub mod users;

use crate::error::{ApiError, Result};

/// Run CPU-bound work (bcrypt) off the async event loop.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Task join error: {e}")))?
}

/// Trimmed value of an optional body field, `None` when missing or blank.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
