use axum::{
    Extension, Form, Json,
    extract::State,
    response::IntoResponse,
};

use marinet_db::StoreError;
use marinet_types::api::{
    Claims, ClearConversationResponse, ConversationResponse, SendTutorMessageRequest, SendTutorMessageResponse,
};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::views::{self, parse_id};

/// GET /ai-tutor — the caller's latest conversation, started on first visit.
pub async fn conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let (conversation, messages) = run_db(&state, move |db| {
        let conversation = match db.latest_conversation(&uid)? {
            Some(c) => c,
            None => db.start_conversation(&uid)?,
        };
        let messages = db.conversation_messages(&conversation.id)?;
        Ok((conversation, messages))
    })
    .await?;

    Ok(Json(ConversationResponse {
        conversation_id: parse_id(&conversation.id, "conversation"),
        messages: messages.into_iter().map(views::tutor_message).collect(),
    }))
}

/// POST /ai-tutor/send — always answers 200 with a usable AI turn once the
/// request itself is valid; upstream failures become a fallback reply.
pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Form(req): Form<SendTutorMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = req.message.unwrap_or_default().trim().to_string();
    if message.is_empty() {
        return Err(ApiError::Validation("Message cannot be empty".into()));
    }

    let uid = claims.sub.to_string();
    let requested = req.conversation_id.filter(|id| !id.trim().is_empty());
    let conversation = run_db(&state, move |db| match requested {
        Some(id) => match db.get_conversation(id.trim())? {
            Some(c) if c.user_id == uid => Ok(c),
            _ => Err(StoreError::Permission("Invalid conversation".into())),
        },
        None => match db.latest_conversation(&uid)? {
            Some(c) => Ok(c),
            None => db.start_conversation(&uid),
        },
    })
    .await?;

    let reply = state.tutor.reply(&message).await;

    let cid = conversation.id.clone();
    let content = reply.content.clone();
    let (user_msg, ai_msg) = run_db(&state, move |db| db.record_turn(&cid, &message, &content)).await?;

    Ok(Json(SendTutorMessageResponse {
        success: true,
        conversation_id: parse_id(&conversation.id, "conversation"),
        user_message: views::tutor_turn(user_msg),
        ai_message: views::tutor_turn(ai_msg),
        error: reply.error.map(|e| e.to_string()),
    }))
}

/// POST /ai-tutor/clear — start over with a fresh conversation.
pub async fn clear(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let conversation = run_db(&state, move |db| db.start_conversation(&uid)).await?;

    Ok(Json(ClearConversationResponse {
        success: true,
        conversation_id: parse_id(&conversation.id, "conversation"),
    }))
}
