use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use marinet_types::api::{Claims, UserVotesResponse};
use marinet_types::models::VoteKind;

use crate::error::ApiError;
use crate::posts::notify_mentions;
use crate::state::{AppState, run_db};
use crate::views::parse_id;

/// POST /vote/{item_id}/{kind} — toggle or switch the caller's vote and
/// return the item's counters.
pub async fn vote(
    State(state): State<AppState>,
    Path((item_id, kind)): Path<(Uuid, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: VoteKind = kind
        .parse()
        .map_err(|e: marinet_types::models::UnknownVoteKind| ApiError::Validation(e.to_string()))?;

    let iid = item_id.to_string();
    let voter = claims.sub.to_string();
    let applied = run_db(&state, move |db| db.apply_vote(&voter, &iid, kind)).await?;

    if state.mentions_on_vote {
        // Mentions in the voted item are sent again, with its author as sender.
        let iid = item_id.to_string();
        match run_db(&state, move |db| db.get_content_item(&iid)).await {
            Ok(Some(item)) => {
                let author = item.author_id.clone();
                notify_mentions(&state, item, author).await;
            }
            Ok(None) => {}
            Err(e) => warn!("Could not reload item {} after vote: {}", item_id, e),
        }
    }

    Ok(Json(applied.tally))
}

/// GET /api/user-votes — the caller's votes, split into feed and group posts.
pub async fn user_votes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let rows = run_db(&state, move |db| db.votes_for_user(&uid)).await?;

    let mut votes = HashMap::new();
    let mut group_votes = HashMap::new();
    for row in rows {
        let Ok(kind) = row.vote_type.parse::<VoteKind>() else {
            warn!("Skipping vote on {} with type '{}'", row.item_id, row.vote_type);
            continue;
        };
        let id = parse_id(&row.item_id, "content item");
        if row.group_id.is_some() {
            group_votes.insert(id, kind);
        } else {
            votes.insert(id, kind);
        }
    }

    Ok(Json(UserVotesResponse { votes, group_votes }))
}
