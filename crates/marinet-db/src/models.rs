/// Database row types — these map directly to SQLite rows.
/// Distinct from marinet-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

/// A feed post (`group_id == None`) or a group post.
#[derive(Debug, Clone)]
pub struct ContentItemRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub author_avatar_url: Option<String>,
    pub group_id: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub created_by: String,
    pub created_at: String,
    pub members_count: i64,
}

#[derive(Debug, Clone)]
pub struct MemberRow {
    pub user_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct VoteRow {
    pub item_id: String,
    pub group_id: Option<String>,
    pub vote_type: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub recipient_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub content: String,
    pub item_id: Option<String>,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct ConversationRow {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct AiMessageRow {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub is_user: bool,
    pub created_at: String,
}
