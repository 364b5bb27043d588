//! Conversions from store rows to the JSON shapes in `marinet_types::api`.

use tracing::warn;
use uuid::Uuid;

use marinet_db::models::{AiMessageRow, ContentItemRow, GroupRow, MemberRow, NotificationRow, UserRow};
use marinet_types::api::{
    ContentItemResponse, GroupMember, GroupSummary, NotificationResponse, TutorMessage, TutorTurn,
    UserProfile, UserSummary,
};
use marinet_types::models::{NotificationKind, parse_timestamp};

/// Ids are generated as UUIDs; a row that fails to parse is logged and mapped to nil.
pub fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::nil()
    })
}

pub fn user_summary(row: &UserRow) -> UserSummary {
    UserSummary {
        id: parse_id(&row.id, "user"),
        username: row.username.clone(),
        avatar_url: row.avatar_url.clone(),
    }
}

pub fn user_profile(row: UserRow) -> UserProfile {
    UserProfile {
        id: parse_id(&row.id, "user"),
        username: row.username,
        avatar_url: row.avatar_url,
        bio: row.bio,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub fn content_item(row: ContentItemRow) -> ContentItemResponse {
    ContentItemResponse {
        id: parse_id(&row.id, "content item"),
        author: UserSummary {
            id: parse_id(&row.author_id, "user"),
            username: row.author_username,
            avatar_url: row.author_avatar_url,
        },
        group_id: row.group_id.as_deref().map(|g| parse_id(g, "group")),
        content: row.content,
        image_url: row.image_url,
        upvotes: row.upvotes,
        downvotes: row.downvotes,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub fn content_items(rows: Vec<ContentItemRow>) -> Vec<ContentItemResponse> {
    rows.into_iter().map(content_item).collect()
}

/// `membership` is `Some(is_admin)` when the caller belongs to the group.
pub fn group_summary(row: GroupRow, membership: Option<bool>) -> GroupSummary {
    GroupSummary {
        id: parse_id(&row.id, "group"),
        name: row.name,
        description: row.description,
        icon: row.icon,
        members_count: row.members_count,
        is_member: membership.is_some(),
        is_admin: membership.unwrap_or(false),
    }
}

pub fn group_member(row: MemberRow) -> GroupMember {
    GroupMember {
        id: parse_id(&row.user_id, "user"),
        username: row.username,
        avatar_url: row.avatar_url,
        is_admin: row.is_admin,
    }
}

pub fn notification(row: NotificationRow) -> NotificationResponse {
    if row.notification_type != NotificationKind::Mention.as_str() {
        warn!("Notification {} has unknown type '{}'", row.id, row.notification_type);
    }
    NotificationResponse {
        id: parse_id(&row.id, "notification"),
        sender_id: parse_id(&row.sender_id, "user"),
        sender_username: row.sender_username,
        content: row.content,
        item_id: row.item_id.as_deref().map(|i| parse_id(i, "content item")),
        notification_type: NotificationKind::Mention,
        is_read: row.is_read,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub fn tutor_message(row: AiMessageRow) -> TutorMessage {
    TutorMessage {
        id: parse_id(&row.id, "ai message"),
        content: row.content,
        is_user: row.is_user,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub fn tutor_turn(row: AiMessageRow) -> TutorTurn {
    TutorTurn {
        id: parse_id(&row.id, "ai message"),
        content: row.content,
        created_at: parse_timestamp(&row.created_at),
    }
}
