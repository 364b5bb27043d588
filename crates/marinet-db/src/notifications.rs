use crate::models::NotificationRow;
use crate::{Database, Result, StoreError};

impl Database {
    /// A user's notifications, newest first.
    pub fn notifications_for(&self, recipient_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT n.id, n.recipient_id, n.sender_id, COALESCE(u.username, 'unknown'), n.content,
                        n.item_id, n.notification_type, n.is_read, n.created_at
                 FROM notifications n
                 LEFT JOIN users u ON u.id = n.sender_id
                 WHERE n.recipient_id = ?1
                 ORDER BY n.created_at DESC, n.rowid DESC",
            )?;
            let rows = stmt
                .query_map([recipient_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        recipient_id: row.get(1)?,
                        sender_id: row.get(2)?,
                        sender_username: row.get(3)?,
                        content: row.get(4)?,
                        item_id: row.get(5)?,
                        notification_type: row.get(6)?,
                        is_read: row.get(7)?,
                        created_at: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn unread_count(&self, recipient_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
                [recipient_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Mark one of the recipient's own notifications as read.
    pub fn mark_notification_read(&self, id: &str, recipient_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND recipient_id = ?2",
                [id, recipient_id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("notification"));
            }
            Ok(())
        })
    }

    pub fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE recipient_id = ?1 AND is_read = 0",
                [recipient_id],
            )?;
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::StoreError;
    use crate::content::NewContent;
    use crate::mentions::MentionSource;
    use crate::testutil::{db, user};

    #[test]
    fn read_flags_are_per_recipient() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let carol = user(&db, "carol");
        let item = db
            .create_content(NewContent {
                author_id: &carol,
                group_id: None,
                content: "@alice @bob",
                image_url: None,
            })
            .unwrap();
        db.process_mentions(&item.content, MentionSource::from(&item), &carol).unwrap();

        assert_eq!(db.unread_count(&alice).unwrap(), 1);
        let note = db.notifications_for(&alice).unwrap().remove(0);
        assert_eq!(note.sender_username, "carol");

        let err = db.mark_notification_read(&note.id, &bob).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        db.mark_notification_read(&note.id, &alice).unwrap();
        assert_eq!(db.unread_count(&alice).unwrap(), 0);
        assert_eq!(db.unread_count(&bob).unwrap(), 1);

        assert_eq!(db.mark_all_notifications_read(&bob).unwrap(), 1);
        assert_eq!(db.unread_count(&bob).unwrap(), 0);
    }
}
