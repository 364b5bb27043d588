use std::sync::Arc;

use tracing::error;

use marinet_db::Database;

use crate::error::ApiError;
use crate::tutor::TutorBridge;
use crate::uploads::UploadStore;

pub type AppState = Arc<AppStateInner>;

/// Services shared by every handler. Built once at startup and passed in.
pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub tutor: TutorBridge,
    pub uploads: UploadStore,
    /// Re-run mention processing over an item's text after each vote on it.
    pub mentions_on_vote: bool,
}

/// Run blocking store work off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> marinet_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
