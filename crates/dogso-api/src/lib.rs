pub mod auth;
pub mod channels;
pub mod comments;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod reactions;
pub mod router;
pub mod threads;
pub mod thumbnail;
pub mod uploads;
pub mod views;

use tracing::error;

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;

/// Run store work (and anything else that blocks, like password hashing)
/// off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
}
