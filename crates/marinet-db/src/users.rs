use rusqlite::{Connection, Row};
use tracing::info;

use crate::models::UserRow;
use crate::{Database, OptionalExt, Result, StoreError, new_id};

const USER_COLUMNS: &str = "id, username, email, password, avatar_url, bio, created_at";

impl Database {
    /// Insert a new account. Username and email must both be unused.
    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        self.with_tx(|conn| {
            if query_user(conn, "email", email)?.is_some() {
                return Err(StoreError::Conflict("Email already in use".into()));
            }
            if query_user(conn, "username", username)?.is_some() {
                return Err(StoreError::Conflict("Username already taken".into()));
            }

            let id = new_id();
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (&id, username, email, password_hash),
            )?;
            info!("Registered user {} ({})", username, id);

            query_user(conn, "id", &id)?.ok_or(StoreError::NotFound("user"))
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    /// Case-insensitive substring match on username or email, at most ten rows.
    /// Queries shorter than two characters return nothing.
    pub fn search_users(&self, query: &str) -> Result<Vec<UserRow>> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Ok(vec![]);
        }

        let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("%{}%", escaped);

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE username LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\'
                 ORDER BY username
                 LIMIT 10"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([&pattern], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Update a profile. Fields passed as `None` keep their stored value.
    pub fn update_profile(
        &self,
        user_id: &str,
        username: Option<&str>,
        bio: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<UserRow> {
        self.with_tx(|conn| {
            if let Some(name) = username {
                if let Some(other) = query_user(conn, "username", name)? {
                    if other.id != user_id {
                        return Err(StoreError::Conflict("Username already taken".into()));
                    }
                }
            }

            let changed = conn.execute(
                "UPDATE users SET username = COALESCE(?1, username), bio = COALESCE(?2, bio),
                        avatar_url = COALESCE(?3, avatar_url)
                 WHERE id = ?4",
                rusqlite::params![username, bio, avatar_url, user_id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }

            query_user(conn, "id", user_id)?.ok_or(StoreError::NotFound("user"))
        })
    }
}

/// `column` is always one of the literal unique columns above.
pub(crate) fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], user_from_row).optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        avatar_url: row.get(4)?,
        bio: row.get(5)?,
        created_at: row.get(6)?,
    })
}
