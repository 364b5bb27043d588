use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use marinet_db::StoreError;
use marinet_types::api::{Claims, ProfileResponse, SearchUsersQuery};

use crate::auth::validate_username;
use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::uploads::read_form;
use crate::views;

/// GET /profile/{user_id} — profile and the user's feed posts.
pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user_id.to_string();
    let (user, posts) = run_db(&state, move |db| {
        let user = db.get_user_by_id(&uid)?.ok_or(StoreError::NotFound("user"))?;
        Ok((user, db.user_posts(&uid)?))
    })
    .await?;

    Ok(Json(ProfileResponse {
        user: views::user_profile(user),
        posts: views::content_items(posts),
    }))
}

/// POST /settings — multipart `username`, `bio` and optional `avatar`.
/// Omitted fields keep their stored value.
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(&state.uploads, multipart, "avatar").await?;

    let username = form.text("username").map(str::trim).map(str::to_string);
    let checked = username.as_deref().map(validate_username).transpose();
    state.uploads.keep_if_ok(form.image_url.as_deref(), checked).await?;
    let bio = form.text("bio").map(str::to_string);
    let avatar_url = form.image_url;

    let uid = claims.sub.to_string();
    let url = avatar_url.clone();
    let updated = run_db(&state, move |db| {
        db.update_profile(&uid, username.as_deref(), bio.as_deref(), url.as_deref())
    })
    .await;
    let user = state.uploads.keep_if_ok(avatar_url.as_deref(), updated).await?;

    Ok(Json(views::user_profile(user)))
}

/// GET /api/search-users?q=
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, move |db| db.search_users(&query.q)).await?;
    Ok(Json(rows.iter().map(views::user_summary).collect::<Vec<_>>()))
}
