use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{ai_tutor, auth, groups, notifications, posts, users, votes};

/// All API routes. Transport layers (CORS, tracing, static files) are added
/// by the binary.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/feed", get(posts::feed))
        .route("/profile/{user_id}", get(users::profile))
        .route("/api/search-users", get(users::search_users))
        .route("/api/trending-tags", get(posts::trending_tags))
        .route("/api/popular-groups", get(groups::popular_groups))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/create_post", post(posts::create_post))
        .route("/create_group_post/{group_id}", post(posts::create_group_post))
        .route("/delete_post/{item_id}", post(posts::delete_post))
        .route("/vote/{item_id}/{kind}", post(votes::vote))
        .route("/api/user-votes", get(votes::user_votes))
        .route("/groups", get(groups::list_groups))
        .route("/groups/{group_id}", get(groups::group_detail))
        .route("/create_group", post(groups::create_group))
        .route("/join_group/{group_id}", post(groups::join_group))
        .route("/leave_group/{group_id}", post(groups::leave_group))
        .route("/settings", post(users::update_settings))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/ai-tutor", get(ai_tutor::conversation))
        .route("/ai-tutor/send", post(ai_tutor::send))
        .route("/ai-tutor/clear", post(ai_tutor::clear))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
