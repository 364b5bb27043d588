use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use marinet_types::api::{Claims, NotificationListResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::views;

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let (rows, unread_count) = run_db(&state, move |db| {
        Ok((db.notifications_for(&uid)?, db.unread_count(&uid)?))
    })
    .await?;

    Ok(Json(NotificationListResponse {
        notifications: rows.into_iter().map(views::notification).collect(),
        unread_count,
    }))
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let nid = id.to_string();
    let uid = claims.sub.to_string();
    run_db(&state, move |db| db.mark_notification_read(&nid, &uid)).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let updated = run_db(&state, move |db| db.mark_all_notifications_read(&uid)).await?;
    Ok(Json(serde_json::json!({ "success": true, "updated": updated })))
}
