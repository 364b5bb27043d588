use std::collections::HashMap;

use rusqlite::{Connection, Row};
use tracing::info;

use crate::models::{GroupRow, MemberRow};
use crate::{Database, OptionalExt, Result, StoreError, new_id};

const GROUP_SELECT: &str = "SELECT g.id, g.name, g.description, g.icon, g.created_by, g.created_at,
                                   (SELECT COUNT(*) FROM group_members m WHERE m.group_id = g.id)
                            FROM campus_groups g";

impl Database {
    /// Create a group and make its creator the first admin member.
    pub fn create_group(
        &self,
        creator_id: &str,
        name: &str,
        description: Option<&str>,
        icon: Option<&str>,
    ) -> Result<GroupRow> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("Group name is required".into()));
        }
        let icon = icon.map(str::trim).filter(|i| !i.is_empty()).unwrap_or("people");

        self.with_tx(|conn| {
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM campus_groups WHERE name = ?1)",
                [name],
                |row| row.get(0),
            )?;
            if taken {
                return Err(StoreError::Conflict("Group name already exists".into()));
            }

            let id = new_id();
            conn.execute(
                "INSERT INTO campus_groups (id, name, description, icon, created_by)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, name, description, icon, creator_id],
            )?;
            insert_membership(conn, &id, creator_id, true)?;

            info!("Group '{}' ({}) created by {}", name, id, creator_id);
            query_group(conn, &id)?.ok_or(StoreError::NotFound("group"))
        })
    }

    pub fn get_group(&self, id: &str) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| query_group(conn, id))
    }

    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| query_groups(conn, "ORDER BY g.name ASC", rusqlite::params![]))
    }

    /// Groups with the most members first.
    pub fn popular_groups(&self, limit: u32) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            query_groups(
                conn,
                "ORDER BY 7 DESC, g.created_at ASC LIMIT ?1",
                rusqlite::params![limit],
            )
        })
    }

    pub fn group_members(&self, group_id: &str) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.avatar_url, m.is_admin
                 FROM group_members m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.group_id = ?1
                 ORDER BY m.is_admin DESC, m.joined_at ASC, u.username ASC",
            )?;
            let rows = stmt
                .query_map([group_id], |row| {
                    Ok(MemberRow {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        avatar_url: row.get(2)?,
                        is_admin: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// group_id -> is_admin for every group the user belongs to.
    pub fn memberships_for_user(&self, user_id: &str) -> Result<HashMap<String, bool>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT group_id, is_admin FROM group_members WHERE user_id = ?1")?;
            let rows = stmt
                .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_member(&self, group_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(query_membership(conn, group_id, user_id)?.is_some()))
    }

    pub fn is_admin(&self, group_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(query_membership(conn, group_id, user_id)? == Some(true)))
    }

    /// Add a non-admin membership. Joining twice is a conflict.
    pub fn join_group(&self, group_id: &str, user_id: &str) -> Result<()> {
        self.with_tx(|conn| {
            if !query_group_exists(conn, group_id)? {
                return Err(StoreError::NotFound("group"));
            }
            if query_membership(conn, group_id, user_id)?.is_some() {
                return Err(StoreError::Conflict(
                    "You are already a member of this group".into(),
                ));
            }
            insert_membership(conn, group_id, user_id, false)?;
            info!("User {} joined group {}", user_id, group_id);
            Ok(())
        })
    }

    /// Remove a membership. The last remaining admin cannot leave.
    pub fn leave_group(&self, group_id: &str, user_id: &str) -> Result<()> {
        self.with_tx(|conn| {
            if !query_group_exists(conn, group_id)? {
                return Err(StoreError::NotFound("group"));
            }
            let is_admin = query_membership(conn, group_id, user_id)?.ok_or_else(|| {
                StoreError::State("You are not a member of this group".into())
            })?;

            if is_admin {
                let admin_count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM group_members WHERE group_id = ?1 AND is_admin = 1",
                    [group_id],
                    |row| row.get(0),
                )?;
                if admin_count == 1 {
                    return Err(StoreError::State(
                        "You cannot leave the group as you are the only admin".into(),
                    ));
                }
            }

            conn.execute(
                "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
                [group_id, user_id],
            )?;
            info!("User {} left group {}", user_id, group_id);
            Ok(())
        })
    }
}

fn insert_membership(conn: &Connection, group_id: &str, user_id: &str, is_admin: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO group_members (group_id, user_id, is_admin) VALUES (?1, ?2, ?3)",
        rusqlite::params![group_id, user_id, is_admin],
    )?;
    Ok(())
}

/// `Some(is_admin)` when the user belongs to the group.
pub(crate) fn query_membership(conn: &Connection, group_id: &str, user_id: &str) -> Result<Option<bool>> {
    conn.query_row(
        "SELECT is_admin FROM group_members WHERE group_id = ?1 AND user_id = ?2",
        [group_id, user_id],
        |row| row.get(0),
    )
    .optional()
}

pub(crate) fn query_group_exists(conn: &Connection, group_id: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM campus_groups WHERE id = ?1)",
        [group_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn query_group(conn: &Connection, id: &str) -> Result<Option<GroupRow>> {
    let sql = format!("{GROUP_SELECT} WHERE g.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([id], group_from_row).optional()
}

fn query_groups<P: rusqlite::Params>(conn: &Connection, tail: &str, params: P) -> Result<Vec<GroupRow>> {
    let sql = format!("{GROUP_SELECT} {tail}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, group_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        created_by: row.get(4)?,
        created_at: row.get(5)?,
        members_count: row.get(6)?,
    })
}
