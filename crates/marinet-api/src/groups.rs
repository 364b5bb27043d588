use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use marinet_types::api::{
    Claims, CreateGroupRequest, CreateGroupResponse, GroupDetailResponse, LimitQuery, MembershipResponse,
};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::views::{self, parse_id};

/// GET /groups — every group with the caller's membership flags.
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let (groups, memberships) = run_db(&state, move |db| {
        Ok((db.list_groups()?, db.memberships_for_user(&uid)?))
    })
    .await?;

    let groups: Vec<_> = groups
        .into_iter()
        .map(|g| {
            let membership = memberships.get(&g.id).copied();
            views::group_summary(g, membership)
        })
        .collect();
    Ok(Json(groups))
}

/// GET /api/popular-groups?limit= — largest groups first.
pub async fn popular_groups(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(3).clamp(1, 50);
    let groups = run_db(&state, move |db| db.popular_groups(limit)).await?;
    Ok(Json(
        groups
            .into_iter()
            .map(|g| views::group_summary(g, None))
            .collect::<Vec<_>>(),
    ))
}

/// GET /groups/{group_id}
pub async fn group_detail(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();
    let (group, members, posts) = run_db(&state, move |db| {
        let group = db.get_group(&gid)?.ok_or(marinet_db::StoreError::NotFound("group"))?;
        Ok((group, db.group_members(&gid)?, db.group_posts(&gid)?))
    })
    .await?;

    let membership = members.iter().find(|m| m.user_id == uid).map(|m| m.is_admin);
    let created_by = parse_id(&group.created_by, "user");
    let members: Vec<_> = members.into_iter().map(views::group_member).collect();
    let admins = members.iter().filter(|m| m.is_admin).cloned().collect();

    Ok(Json(GroupDetailResponse {
        group: views::group_summary(group, membership),
        created_by,
        members,
        admins,
        posts: views::content_items(posts),
    }))
}

/// POST /create_group — the creator becomes the first admin.
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let group = run_db(&state, move |db| {
        db.create_group(&uid, &req.name, req.description.as_deref(), req.icon.as_deref())
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGroupResponse {
            success: true,
            group_id: parse_id(&group.id, "group"),
        }),
    ))
}

/// POST /join_group/{group_id}
pub async fn join_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();
    run_db(&state, move |db| db.join_group(&gid, &uid)).await?;

    Ok(Json(MembershipResponse {
        success: true,
        group_id,
        is_member: true,
    }))
}

/// POST /leave_group/{group_id}
pub async fn leave_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();
    run_db(&state, move |db| db.leave_group(&gid, &uid)).await?;

    Ok(Json(MembershipResponse {
        success: true,
        group_id,
        is_member: false,
    }))
}
