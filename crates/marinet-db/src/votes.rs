use rusqlite::Connection;
use tracing::debug;

use marinet_types::models::{VoteKind, VoteTally};

use crate::content::query_item;
use crate::groups::query_membership;
use crate::models::VoteRow;
use crate::{Database, OptionalExt, Result, StoreError, new_id};

/// Which transition of the per-(voter, item) state machine a vote took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// No prior vote; a ledger row was inserted.
    Cast,
    /// Same kind as the existing vote; the row was deleted.
    Retracted,
    /// Opposite kind; the row was updated in place.
    Switched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedVote {
    pub outcome: VoteOutcome,
    pub tally: VoteTally,
}

impl Database {
    /// Apply one vote and return the item's refreshed counters.
    ///
    /// The ledger row and the denormalized counters change in the same
    /// transaction, so the counters always equal the ledger's per-kind counts.
    /// Voting on a group post requires membership of that group.
    pub fn apply_vote(&self, voter_id: &str, item_id: &str, kind: VoteKind) -> Result<AppliedVote> {
        self.with_tx(|conn| {
            let item = query_item(conn, item_id)?.ok_or(StoreError::NotFound("content item"))?;

            if let Some(group_id) = &item.group_id {
                if query_membership(conn, group_id, voter_id)?.is_none() {
                    return Err(StoreError::Permission(
                        "You must be a member of the group to vote".into(),
                    ));
                }
            }

            let existing: Option<(String, String)> = conn
                .query_row(
                    "SELECT id, vote_type FROM votes WHERE voter_id = ?1 AND item_id = ?2",
                    [voter_id, item_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let outcome = match existing {
                None => {
                    conn.execute(
                        "INSERT INTO votes (id, voter_id, item_id, vote_type) VALUES (?1, ?2, ?3, ?4)",
                        (new_id(), voter_id, item_id, kind.as_str()),
                    )?;
                    adjust_counter(conn, item_id, kind, 1)?;
                    VoteOutcome::Cast
                }
                Some((vote_id, previous)) => {
                    let previous: VoteKind = previous
                        .parse()
                        .map_err(|e| anyhow::anyhow!("corrupt vote row {}: {}", vote_id, e))?;

                    if previous == kind {
                        conn.execute("DELETE FROM votes WHERE id = ?1", [&vote_id])?;
                        adjust_counter(conn, item_id, kind, -1)?;
                        VoteOutcome::Retracted
                    } else {
                        conn.execute(
                            "UPDATE votes SET vote_type = ?1, created_at = datetime('now') WHERE id = ?2",
                            (kind.as_str(), &vote_id),
                        )?;
                        adjust_counter(conn, item_id, kind, 1)?;
                        adjust_counter(conn, item_id, previous, -1)?;
                        VoteOutcome::Switched
                    }
                }
            };

            let tally = query_tally(conn, item_id)?;
            debug!(
                "Vote {:?} {} by {} on {} -> {}/{}",
                outcome, kind, voter_id, item_id, tally.upvotes, tally.downvotes
            );
            Ok(AppliedVote { outcome, tally })
        })
    }

    /// Counters as stored on the item.
    pub fn item_tally(&self, item_id: &str) -> Result<VoteTally> {
        self.with_conn(|conn| query_tally(conn, item_id))
    }

    /// Counters recomputed from the ledger rows.
    pub fn ledger_tally(&self, item_id: &str) -> Result<VoteTally> {
        self.with_conn(|conn| {
            let tally = conn.query_row(
                "SELECT COALESCE(SUM(vote_type = 'upvote'), 0), COALESCE(SUM(vote_type = 'downvote'), 0)
                 FROM votes WHERE item_id = ?1",
                [item_id],
                |row| {
                    Ok(VoteTally {
                        upvotes: row.get(0)?,
                        downvotes: row.get(1)?,
                    })
                },
            )?;
            Ok(tally)
        })
    }

    /// Every current vote of a user, with the group scope of the voted item.
    pub fn votes_for_user(&self, user_id: &str) -> Result<Vec<VoteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT v.item_id, c.group_id, v.vote_type
                 FROM votes v
                 JOIN content_items c ON c.id = v.item_id
                 WHERE v.voter_id = ?1",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(VoteRow {
                        item_id: row.get(0)?,
                        group_id: row.get(1)?,
                        vote_type: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Add `delta` to the counter for `kind`, never going below zero.
fn adjust_counter(conn: &Connection, item_id: &str, kind: VoteKind, delta: i64) -> Result<()> {
    let sql = match kind {
        VoteKind::Upvote => "UPDATE content_items SET upvotes = MAX(0, upvotes + ?1) WHERE id = ?2",
        VoteKind::Downvote => "UPDATE content_items SET downvotes = MAX(0, downvotes + ?1) WHERE id = ?2",
    };
    conn.execute(sql, rusqlite::params![delta, item_id])?;
    Ok(())
}

fn query_tally(conn: &Connection, item_id: &str) -> Result<VoteTally> {
    conn.query_row(
        "SELECT upvotes, downvotes FROM content_items WHERE id = ?1",
        [item_id],
        |row| {
            Ok(VoteTally {
                upvotes: row.get(0)?,
                downvotes: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(StoreError::NotFound("content item"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::NewContent;
    use crate::testutil::{db, user};
    use VoteKind::{Downvote, Upvote};

    fn item(db: &Database, author: &str, group_id: Option<&str>) -> String {
        db.create_content(NewContent {
            author_id: author,
            group_id,
            content: "vote on me",
            image_url: None,
        })
        .unwrap()
        .id
    }

    fn ledger_rows(db: &Database, voter: &str, item_id: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM votes WHERE voter_id = ?1 AND item_id = ?2",
                [voter, item_id],
                |row| row.get(0),
            )?)
        })
        .unwrap()
    }

    fn assert_consistent(db: &Database, item_id: &str) {
        assert_eq!(db.item_tally(item_id).unwrap(), db.ledger_tally(item_id).unwrap());
    }

    #[test]
    fn cast_retract_switch_state_machine() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = item(&db, &alice, None);

        let v = db.apply_vote(&bob, &id, Upvote).unwrap();
        assert_eq!(v.outcome, VoteOutcome::Cast);
        assert_eq!(v.tally, VoteTally { upvotes: 1, downvotes: 0 });
        assert_eq!(ledger_rows(&db, &bob, &id), 1);
        assert_consistent(&db, &id);

        let v = db.apply_vote(&bob, &id, Downvote).unwrap();
        assert_eq!(v.outcome, VoteOutcome::Switched);
        assert_eq!(v.tally, VoteTally { upvotes: 0, downvotes: 1 });
        assert_eq!(ledger_rows(&db, &bob, &id), 1);
        assert_consistent(&db, &id);

        let v = db.apply_vote(&bob, &id, Downvote).unwrap();
        assert_eq!(v.outcome, VoteOutcome::Retracted);
        assert_eq!(v.tally, VoteTally::default());
        assert_eq!(ledger_rows(&db, &bob, &id), 0);
        assert_consistent(&db, &id);
    }

    #[test]
    fn repeated_same_kind_returns_to_start() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = item(&db, &alice, None);

        db.apply_vote(&bob, &id, Upvote).unwrap();
        let v = db.apply_vote(&bob, &id, Upvote).unwrap();
        assert_eq!(v.tally, VoteTally::default());
        assert_eq!(ledger_rows(&db, &bob, &id), 0);
    }

    #[test]
    fn many_voters_keep_counters_equal_to_ledger() {
        let db = db();
        let alice = user(&db, "alice");
        let id = item(&db, &alice, None);
        let voters: Vec<String> = (0..6).map(|i| user(&db, &format!("voter{i}"))).collect();

        let script = [Upvote, Downvote, Upvote, Upvote, Downvote, Downvote, Upvote, Upvote];
        for (step, kind) in script.iter().enumerate() {
            for (n, voter) in voters.iter().enumerate() {
                if (step + n) % 3 != 0 {
                    let v = db.apply_vote(voter, &id, *kind).unwrap();
                    assert!(v.tally.upvotes >= 0 && v.tally.downvotes >= 0);
                    assert!(ledger_rows(&db, voter, &id) <= 1);
                }
            }
            assert_consistent(&db, &id);
        }
    }

    #[test]
    fn counters_floor_at_zero_when_out_of_sync() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = item(&db, &alice, None);
        db.apply_vote(&bob, &id, Upvote).unwrap();

        // Simulate a counter that drifted below the ledger.
        db.with_conn(|conn| {
            conn.execute("UPDATE content_items SET upvotes = 0 WHERE id = ?1", [&id])?;
            Ok(())
        })
        .unwrap();

        let v = db.apply_vote(&bob, &id, Downvote).unwrap();
        assert_eq!(v.tally, VoteTally { upvotes: 0, downvotes: 1 });
    }

    #[test]
    fn group_votes_require_membership() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let group = db.create_group(&alice, "Chess", None, None).unwrap();
        let id = item(&db, &alice, Some(&group.id));

        let err = db.apply_vote(&bob, &id, Upvote).unwrap_err();
        assert!(matches!(err, StoreError::Permission(_)));
        assert_eq!(db.item_tally(&id).unwrap(), VoteTally::default());
        assert_eq!(ledger_rows(&db, &bob, &id), 0);

        db.join_group(&group.id, &bob).unwrap();
        let v = db.apply_vote(&bob, &id, Upvote).unwrap();
        assert_eq!(v.tally.upvotes, 1);

        let votes = db.votes_for_user(&bob).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].group_id.as_deref(), Some(group.id.as_str()));
        assert_eq!(votes[0].vote_type, "upvote");
    }

    #[test]
    fn unknown_item_is_not_found() {
        let db = db();
        let bob = user(&db, "bob");
        let err = db.apply_vote(&bob, "missing", Upvote).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
