use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::Connection;

use crate::models::TagRow;
use crate::{Database, OptionalExt, Result};

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("hashtag pattern is valid"));

/// Distinct hashtags in `text`, lower-cased and without the leading `#`.
pub fn extract_hashtags(text: &str) -> BTreeSet<String> {
    HASHTAG
        .captures_iter(text)
        .map(|c| c[1].to_lowercase())
        .collect()
}

/// Count one occurrence of each tag. Tags are never decremented.
pub(crate) fn bump_tags(conn: &Connection, names: &BTreeSet<String>) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO tags (name, count) VALUES (?1, 1)
         ON CONFLICT(name) DO UPDATE SET count = count + 1",
    )?;
    for name in names {
        stmt.execute([name])?;
    }
    Ok(())
}

impl Database {
    pub fn trending_tags(&self, limit: u32) -> Result<Vec<TagRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, count FROM tags ORDER BY count DESC, name ASC LIMIT ?1")?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(TagRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        count: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_tag(&self, name: &str) -> Result<Option<TagRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, count FROM tags WHERE name = ?1",
                [name],
                |row| {
                    Ok(TagRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        count: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::db;

    #[test]
    fn hashtags_are_lowercased_and_deduplicated() {
        let tags = extract_hashtags("#Rust meetup! #rust #campus_life, not a#tag? #");
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["campus_life", "rust", "tag"]);
    }

    #[test]
    fn counters_start_at_one_and_only_grow() {
        let db = db();
        let first = extract_hashtags("#exams");
        let second = extract_hashtags("#exams #library");

        db.with_tx(|conn| bump_tags(conn, &first)).unwrap();
        db.with_tx(|conn| bump_tags(conn, &second)).unwrap();

        assert_eq!(db.get_tag("exams").unwrap().unwrap().count, 2);
        assert_eq!(db.get_tag("library").unwrap().unwrap().count, 1);

        let trending: Vec<String> = db.trending_tags(10).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(trending, vec!["exams", "library"]);
    }
}
