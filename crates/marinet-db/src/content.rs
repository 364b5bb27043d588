use rusqlite::{Connection, Row};
use tracing::info;

use crate::groups::{query_group_exists, query_membership};
use crate::models::ContentItemRow;
use crate::tags::{bump_tags, extract_hashtags};
use crate::{Database, OptionalExt, Result, StoreError, new_id};

/// Longest accepted body, in characters.
pub const MAX_CONTENT_CHARS: usize = 900;

const ITEM_SELECT: &str = "SELECT c.id, c.author_id, u.username, u.avatar_url, c.group_id, c.content,
                                  c.image_url, c.upvotes, c.downvotes, c.created_at
                           FROM content_items c
                           JOIN users u ON u.id = c.author_id";

/// Input for a new feed post or group post.
#[derive(Debug, Clone, Copy)]
pub struct NewContent<'a> {
    pub author_id: &'a str,
    pub group_id: Option<&'a str>,
    pub content: &'a str,
    pub image_url: Option<&'a str>,
}

impl Database {
    /// Insert a content item and count its hashtags in one transaction.
    /// Group posts require the author to be a current member of the group.
    pub fn create_content(&self, new: NewContent<'_>) -> Result<ContentItemRow> {
        validate_body(new.content, new.image_url.is_some())?;

        self.with_tx(|conn| {
            if let Some(group_id) = new.group_id {
                if !query_group_exists(conn, group_id)? {
                    return Err(StoreError::NotFound("group"));
                }
                if query_membership(conn, group_id, new.author_id)?.is_none() {
                    return Err(StoreError::Permission(
                        "You must be a member of the group to post".into(),
                    ));
                }
            }

            let id = new_id();
            conn.execute(
                "INSERT INTO content_items (id, author_id, group_id, content, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, new.author_id, new.group_id, new.content, new.image_url],
            )?;
            bump_tags(conn, &extract_hashtags(new.content))?;

            info!(
                "Created {} {} by {}",
                if new.group_id.is_some() { "group post" } else { "post" },
                id,
                new.author_id
            );
            query_item(conn, &id)?.ok_or(StoreError::NotFound("content item"))
        })
    }

    pub fn get_content_item(&self, id: &str) -> Result<Option<ContentItemRow>> {
        self.with_conn(|conn| query_item(conn, id))
    }

    /// Every feed post (not group posts), newest first.
    pub fn feed(&self) -> Result<Vec<ContentItemRow>> {
        self.with_conn(|conn| {
            query_items(conn, "WHERE c.group_id IS NULL ORDER BY c.created_at DESC, c.rowid DESC", rusqlite::params![])
        })
    }

    pub fn group_posts(&self, group_id: &str) -> Result<Vec<ContentItemRow>> {
        self.with_conn(|conn| {
            query_items(
                conn,
                "WHERE c.group_id = ?1 ORDER BY c.created_at DESC, c.rowid DESC",
                [group_id],
            )
        })
    }

    /// A user's feed posts, newest first.
    pub fn user_posts(&self, user_id: &str) -> Result<Vec<ContentItemRow>> {
        self.with_conn(|conn| {
            query_items(
                conn,
                "WHERE c.author_id = ?1 AND c.group_id IS NULL ORDER BY c.created_at DESC, c.rowid DESC",
                [user_id],
            )
        })
    }

    /// Delete an item together with its ledger rows and the notifications that
    /// point at it. Only the author may delete.
    pub fn delete_content_item(&self, item_id: &str, user_id: &str) -> Result<()> {
        self.with_tx(|conn| {
            let item = query_item(conn, item_id)?.ok_or(StoreError::NotFound("content item"))?;
            if item.author_id != user_id {
                return Err(StoreError::Permission("You can only delete your own posts".into()));
            }

            conn.execute("DELETE FROM votes WHERE item_id = ?1", [item_id])?;
            conn.execute("DELETE FROM notifications WHERE item_id = ?1", [item_id])?;
            conn.execute("DELETE FROM content_items WHERE id = ?1", [item_id])?;

            info!("Deleted content item {} by {}", item_id, user_id);
            Ok(())
        })
    }
}

fn validate_body(content: &str, has_image: bool) -> Result<()> {
    if content.trim().is_empty() && !has_image {
        return Err(StoreError::Validation("Post cannot be empty".into()));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(StoreError::Validation(format!(
            "Post cannot exceed {} characters",
            MAX_CONTENT_CHARS
        )));
    }
    Ok(())
}

pub(crate) fn query_item(conn: &Connection, id: &str) -> Result<Option<ContentItemRow>> {
    let sql = format!("{ITEM_SELECT} WHERE c.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([id], item_from_row).optional()
}

fn query_items<P: rusqlite::Params>(conn: &Connection, tail: &str, params: P) -> Result<Vec<ContentItemRow>> {
    let sql = format!("{ITEM_SELECT} {tail}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, item_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ContentItemRow> {
    Ok(ContentItemRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row.get(2)?,
        author_avatar_url: row.get(3)?,
        group_id: row.get(4)?,
        content: row.get(5)?,
        image_url: row.get(6)?,
        upvotes: row.get(7)?,
        downvotes: row.get(8)?,
        created_at: row.get(9)?,
    })
}
