use rusqlite::{Connection, Row};
use tracing::info;

use crate::models::{AiMessageRow, ConversationRow};
use crate::{Database, OptionalExt, Result, StoreError, new_id};

/// First message of every new tutor conversation.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your AI Tutor. How can I help you today?\n\n\
You can ask me questions about Mathematics, Science, English, Literature, History, and many other subjects!";

impl Database {
    /// The user's most recently started conversation.
    pub fn latest_conversation(&self, user_id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, created_at FROM ai_conversations
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
                [user_id],
                conversation_from_row,
            )
            .optional()
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, created_at FROM ai_conversations WHERE id = ?1",
                [id],
                conversation_from_row,
            )
            .optional()
        })
    }

    /// Create a conversation whose first message is the tutor's welcome.
    pub fn start_conversation(&self, user_id: &str) -> Result<ConversationRow> {
        self.with_tx(|conn| {
            let id = new_id();
            conn.execute(
                "INSERT INTO ai_conversations (id, user_id) VALUES (?1, ?2)",
                (&id, user_id),
            )?;
            insert_message(conn, &id, WELCOME_MESSAGE, false)?;
            info!("Started tutor conversation {} for {}", id, user_id);

            conn.query_row(
                "SELECT id, user_id, created_at FROM ai_conversations WHERE id = ?1",
                [&id],
                conversation_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound("conversation"))
        })
    }

    /// Messages of a conversation in the order they were appended.
    pub fn conversation_messages(&self, conversation_id: &str) -> Result<Vec<AiMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, content, is_user, created_at
                 FROM ai_messages
                 WHERE conversation_id = ?1
                 ORDER BY rowid ASC",
            )?;
            let rows = stmt
                .query_map([conversation_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Append a user message and the tutor's reply together.
    pub fn record_turn(
        &self,
        conversation_id: &str,
        user_text: &str,
        reply_text: &str,
    ) -> Result<(AiMessageRow, AiMessageRow)> {
        self.with_tx(|conn| {
            let user_msg = insert_message(conn, conversation_id, user_text, true)?;
            let reply = insert_message(conn, conversation_id, reply_text, false)?;
            Ok((user_msg, reply))
        })
    }
}

fn insert_message(conn: &Connection, conversation_id: &str, content: &str, is_user: bool) -> Result<AiMessageRow> {
    let id = new_id();
    conn.execute(
        "INSERT INTO ai_messages (id, conversation_id, content, is_user) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id, conversation_id, content, is_user],
    )?;
    let row = conn.query_row(
        "SELECT id, conversation_id, content, is_user, created_at FROM ai_messages WHERE id = ?1",
        [&id],
        message_from_row,
    )?;
    Ok(row)
}

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<AiMessageRow> {
    Ok(AiMessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        content: row.get(2)?,
        is_user: row.get(3)?,
        created_at: row.get(4)?,
    })
}
