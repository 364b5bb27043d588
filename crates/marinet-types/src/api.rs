use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NotificationKind, VoteKind};

// -- JWT Claims --

/// JWT claims issued at login/registration and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
    pub posts: Vec<ContentItemResponse>,
}

#[derive(Debug, Deserialize)]
pub struct SearchUsersQuery {
    #[serde(default)]
    pub q: String,
}

// -- Content --

/// A feed post or a group post. `group_id` is set only for group posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItemResponse {
    pub id: Uuid,
    pub author: UserSummary,
    pub group_id: Option<Uuid>,
    pub content: String,
    pub image_url: Option<String>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletePostResponse {
    pub success: bool,
    pub id: Uuid,
}

// -- Votes --

#[derive(Debug, Serialize, Deserialize)]
pub struct UserVotesResponse {
    pub votes: HashMap<Uuid, VoteKind>,
    pub group_votes: HashMap<Uuid, VoteKind>,
}

// -- Groups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGroupResponse {
    pub success: bool,
    pub group_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub members_count: i64,
    pub is_member: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupDetailResponse {
    pub group: GroupSummary,
    pub created_by: Uuid,
    pub members: Vec<GroupMember>,
    pub admins: Vec<GroupMember>,
    pub posts: Vec<ContentItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub success: bool,
    pub group_id: Uuid,
    pub is_member: bool,
}

// -- Tags --

#[derive(Debug, Serialize, Deserialize)]
pub struct TagResponse {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

// -- Notifications --

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub content: String,
    pub item_id: Option<Uuid>,
    pub notification_type: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

// -- AI tutor --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorMessage {
    pub id: Uuid,
    pub content: String,
    pub is_user: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: Uuid,
    pub messages: Vec<TutorMessage>,
}

/// Form body of `POST /ai-tutor/send`. Both fields are optional at the
/// decoding layer so that a missing message is reported as a 400.
#[derive(Debug, Deserialize)]
pub struct SendTutorMessageRequest {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorTurn {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendTutorMessageResponse {
    pub success: bool,
    pub conversation_id: Uuid,
    pub user_message: TutorTurn,
    pub ai_message: TutorTurn,
    /// Upstream failure description when the reply is a fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearConversationResponse {
    pub success: bool,
    pub conversation_id: Uuid,
}
