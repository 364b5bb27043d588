use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::{Transaction, TransactionBehavior};
use tracing::{debug, info};

use marinet_types::models::{ContentKind, NotificationKind};

use crate::models::ContentItemRow;
use crate::users::query_user;
use crate::{Database, Result, StoreError, new_id};

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("mention pattern is valid"));

/// Distinct usernames mentioned in `text`, without the leading `@`.
/// Case is preserved; resolution against the user directory is exact.
pub fn extract_mentions(text: &str) -> BTreeSet<&str> {
    MENTION
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// The content a mention was found in.
#[derive(Debug, Clone, Copy)]
pub struct MentionSource<'a> {
    pub item_id: &'a str,
    pub kind: ContentKind,
}

impl<'a> From<&'a ContentItemRow> for MentionSource<'a> {
    fn from(item: &'a ContentItemRow) -> Self {
        Self {
            item_id: &item.id,
            kind: ContentKind::from_group(item.group_id.as_deref()),
        }
    }
}

impl Database {
    /// Create one mention notification per distinct `@username` in `text`
    /// that names an existing user other than `sender_id`.
    ///
    /// Unknown usernames and self-mentions are skipped silently. All rows are
    /// written in a single transaction; nothing is written when no row is
    /// produced. Returns the number of notifications created.
    ///
    /// Repeated calls for the same text create new rows each time.
    pub fn process_mentions(&self, text: &str, source: MentionSource<'_>, sender_id: &str) -> Result<usize> {
        let mentioned = extract_mentions(text);
        if mentioned.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let sender = query_user(conn, "id", sender_id)?.ok_or(StoreError::NotFound("user"))?;

            let mut recipients = Vec::new();
            for username in &mentioned {
                match query_user(conn, "username", username)? {
                    None => debug!("Mention of unknown user @{} skipped", username),
                    Some(user) if user.id == sender.id => debug!("Self-mention by @{} skipped", username),
                    Some(user) => recipients.push(user),
                }
            }

            if recipients.is_empty() {
                return Ok(0);
            }

            let content = format!("{} mentioned you in a {}", sender.username, source.kind.label());
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO notifications
                         (id, recipient_id, sender_id, content, item_id, notification_type, is_read)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                )?;
                for recipient in &recipients {
                    stmt.execute(rusqlite::params![
                        new_id(),
                        recipient.id,
                        sender.id,
                        content,
                        source.item_id,
                        NotificationKind::Mention.as_str(),
                    ])?;
                }
            }
            tx.commit()?;

            info!(
                "{} mention notification(s) from {} for {} {}",
                recipients.len(),
                sender.username,
                source.kind.label(),
                source.item_id
            );
            Ok(recipients.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::NewContent;
    use crate::testutil::{db, user};

    fn post(db: &Database, author: &str, text: &str) -> ContentItemRow {
        db.create_content(NewContent {
            author_id: author,
            group_id: None,
            content: text,
            image_url: None,
        })
        .unwrap()
    }

    fn recipients(db: &Database) -> Vec<String> {
        db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.username FROM notifications n JOIN users u ON u.id = n.recipient_id
                 ORDER BY u.username",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .unwrap()
    }

    #[test]
    fn duplicate_mentions_collapse() {
        let set = extract_mentions("hello @alice and @bob, cc @alice");
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["alice", "bob"]);
    }

    #[test]
    fn one_notification_per_distinct_existing_user() {
        let db = db();
        user(&db, "alice");
        user(&db, "bob");
        let carol = user(&db, "carol");
        let text = "hello @alice and @bob, cc @alice";
        let item = post(&db, &carol, text);

        let created = db.process_mentions(text, MentionSource::from(&item), &carol).unwrap();
        assert_eq!(created, 2);
        assert_eq!(recipients(&db), vec!["alice", "bob"]);

        let alice_id = db.get_user_by_username("alice").unwrap().unwrap().id;
        let notes = db.notifications_for(&alice_id).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "carol mentioned you in a post");
        assert_eq!(notes[0].item_id.as_deref(), Some(item.id.as_str()));
        assert_eq!(notes[0].notification_type, "mention");
        assert!(!notes[0].is_read);
    }

    #[test]
    fn unknown_and_self_mentions_are_skipped() {
        let db = db();
        let carol = user(&db, "carol");
        let item = post(&db, &carol, "@ghost and @carol");

        let created = db
            .process_mentions("@ghost and @carol", MentionSource::from(&item), &carol)
            .unwrap();
        assert_eq!(created, 0);
        assert!(recipients(&db).is_empty());
    }

    #[test]
    fn resolution_is_case_sensitive() {
        let db = db();
        user(&db, "alice");
        let carol = user(&db, "carol");
        let item = post(&db, &carol, "@Alice");

        assert_eq!(db.process_mentions("@Alice", MentionSource::from(&item), &carol).unwrap(), 0);
    }

    #[test]
    fn group_posts_are_labelled() {
        let db = db();
        let alice = user(&db, "alice");
        let carol = user(&db, "carol");
        let group = db.create_group(&carol, "Chess", None, None).unwrap();
        let item = db
            .create_content(NewContent {
                author_id: &carol,
                group_id: Some(&group.id),
                content: "@alice",
                image_url: None,
            })
            .unwrap();

        db.process_mentions(&item.content, MentionSource::from(&item), &carol).unwrap();
        let notes = db.notifications_for(&alice).unwrap();
        assert_eq!(notes[0].content, "carol mentioned you in a group post");
    }

    #[test]
    fn repeated_calls_are_not_deduplicated() {
        let db = db();
        user(&db, "alice");
        let carol = user(&db, "carol");
        let item = post(&db, &carol, "@alice");

        db.process_mentions("@alice", MentionSource::from(&item), &carol).unwrap();
        db.process_mentions("@alice", MentionSource::from(&item), &carol).unwrap();
        assert_eq!(recipients(&db).len(), 2);
    }
}
