use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use marinet_db::content::NewContent;
use marinet_db::mentions::MentionSource;
use marinet_db::models::ContentItemRow;
use marinet_types::api::{Claims, DeletePostResponse, LimitQuery, TagResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::uploads::read_form;
use crate::views;

/// GET /feed — every feed post, newest first.
pub async fn feed(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.feed()).await?;
    Ok(Json(views::content_items(rows)))
}

/// POST /create_post — multipart `content` and optional `image`.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    create_content(state, claims, None, multipart).await
}

/// POST /create_group_post/{group_id} — same as `create_post`, members only.
pub async fn create_group_post(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    create_content(state, claims, Some(group_id.to_string()), multipart).await
}

async fn create_content(
    state: AppState,
    claims: Claims,
    group_id: Option<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(&state.uploads, multipart, "image").await?;
    let content = form.text("content").unwrap_or_default().to_string();
    let image_url = form.image_url;
    let author_id = claims.sub.to_string();

    let aid = author_id.clone();
    let url = image_url.clone();
    let created = run_db(&state, move |db| {
        db.create_content(NewContent {
            author_id: &aid,
            group_id: group_id.as_deref(),
            content: &content,
            image_url: url.as_deref(),
        })
    })
    .await;
    let item = state.uploads.keep_if_ok(image_url.as_deref(), created).await?;

    notify_mentions(&state, item.clone(), author_id).await;

    Ok((StatusCode::CREATED, Json(views::content_item(item))))
}

/// POST /delete_post/{item_id} — authors only.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let iid = item_id.to_string();
    let uid = claims.sub.to_string();
    run_db(&state, move |db| db.delete_content_item(&iid, &uid)).await?;

    Ok(Json(DeletePostResponse {
        success: true,
        id: item_id,
    }))
}

/// GET /api/trending-tags?limit=
pub async fn trending_tags(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 50);
    let rows = run_db(&state, move |db| db.trending_tags(limit)).await?;

    Ok(Json(
        rows.into_iter()
            .map(|t| TagResponse {
                name: t.name,
                count: t.count,
            })
            .collect::<Vec<_>>(),
    ))
}

/// Run the mention notifier for `item`. Failures are logged, never returned.
pub(crate) async fn notify_mentions(state: &AppState, item: ContentItemRow, sender_id: String) {
    let item_id = item.id.clone();
    let result = run_db(state, move |db| {
        db.process_mentions(&item.content, MentionSource::from(&item), &sender_id)
    })
    .await;

    if let Err(e) = result {
        warn!("Mention processing for {} failed: {}", item_id, e);
    }
}
