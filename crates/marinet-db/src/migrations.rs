use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                avatar_url  TEXT DEFAULT '/static/default_avatar.jpg',
                bio         TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE campus_groups (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                description TEXT,
                icon        TEXT NOT NULL DEFAULT 'people',
                created_by  TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE group_members (
                group_id    TEXT NOT NULL REFERENCES campus_groups(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id),
                is_admin    INTEGER NOT NULL DEFAULT 0,
                joined_at   TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (group_id, user_id)
            );

            -- Feed posts and group posts share one table; group_id is NULL for the feed.
            CREATE TABLE content_items (
                id          TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL REFERENCES users(id),
                group_id    TEXT REFERENCES campus_groups(id),
                content     TEXT NOT NULL,
                image_url   TEXT,
                upvotes     INTEGER NOT NULL DEFAULT 0 CHECK (upvotes >= 0),
                downvotes   INTEGER NOT NULL DEFAULT 0 CHECK (downvotes >= 0),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_content_group ON content_items(group_id, created_at);
            CREATE INDEX idx_content_author ON content_items(author_id, created_at);

            CREATE TABLE votes (
                id          TEXT PRIMARY KEY,
                voter_id    TEXT NOT NULL REFERENCES users(id),
                item_id     TEXT NOT NULL REFERENCES content_items(id),
                vote_type   TEXT NOT NULL CHECK (vote_type IN ('upvote', 'downvote')),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(voter_id, item_id)
            );

            CREATE INDEX idx_votes_item ON votes(item_id);

            CREATE TABLE notifications (
                id                  TEXT PRIMARY KEY,
                recipient_id        TEXT NOT NULL REFERENCES users(id),
                sender_id           TEXT NOT NULL REFERENCES users(id),
                content             TEXT NOT NULL,
                item_id             TEXT REFERENCES content_items(id),
                notification_type   TEXT NOT NULL,
                is_read             INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_recipient ON notifications(recipient_id, created_at);

            CREATE TABLE tags (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL UNIQUE,
                count   INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE ai_conversations (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE ai_messages (
                id              TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES ai_conversations(id),
                content         TEXT NOT NULL,
                is_user         INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_ai_messages_conversation ON ai_messages(conversation_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
