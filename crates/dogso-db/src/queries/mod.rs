mod channels;
mod comments;
mod reactions;
mod threads;
mod users;

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;
use rusqlite::types::Value;

use crate::models::ReactionCountRow;

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_constraint(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.extended_code == extended_code)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    is_constraint(err, rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    is_constraint(err, rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

/// Which set of targets a batch reaction count covers.
#[derive(Clone, Copy)]
enum ReactionScope<'a> {
    /// Thread-level reactions on every thread, or on one channel's threads.
    Threads { channel_slug: Option<&'a str> },
    /// Thread-level reactions on a single thread.
    Thread(i64),
    /// Reactions on every comment of a thread.
    CommentsOf(i64),
}

/// Per-type reaction counts keyed by target id, for every target in `scope`.
/// The scope is expressed as a join so the statement binds a single
/// parameter however many targets it covers.
fn reaction_counts(conn: &Connection, scope: ReactionScope<'_>) -> Result<HashMap<i64, Vec<ReactionCountRow>>> {
    let (sql, param): (&str, Value) = match scope {
        ReactionScope::Threads { channel_slug } => (
            "SELECT r.thread_id, r.type, COUNT(*) FROM reactions r
             JOIN threads t ON r.thread_id = t.id
             JOIN channels c ON t.channel_id = c.id
             WHERE r.comment_id IS NULL AND (?1 IS NULL OR c.slug = ?1)
             GROUP BY r.thread_id, r.type
             ORDER BY r.thread_id, r.type",
            channel_slug.map(str::to_string).into(),
        ),
        ReactionScope::Thread(thread_id) => (
            "SELECT r.thread_id, r.type, COUNT(*) FROM reactions r
             WHERE r.comment_id IS NULL AND r.thread_id = ?1
             GROUP BY r.thread_id, r.type
             ORDER BY r.type",
            thread_id.into(),
        ),
        ReactionScope::CommentsOf(thread_id) => (
            "SELECT r.comment_id, r.type, COUNT(*) FROM reactions r
             JOIN comments cm ON r.comment_id = cm.id
             WHERE r.thread_id IS NULL AND cm.thread_id = ?1
             GROUP BY r.comment_id, r.type
             ORDER BY r.comment_id, r.type",
            thread_id.into(),
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([param])?;

    let mut counts: HashMap<i64, Vec<ReactionCountRow>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        counts.entry(id).or_default().push(ReactionCountRow {
            kind: row.get(1)?,
            count: row.get(2)?,
        });
    }
    Ok(counts)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::Database;
    use crate::models::{NewThread, UserInsert};

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn user(db: &Database, name: &str) -> i64 {
        match db
            .create_user(name, &format!("{}@example.com", name), "hash")
            .unwrap()
        {
            UserInsert::Created(row) => row.id,
            UserInsert::Taken => panic!("user {} already exists", name),
        }
    }

    pub fn thread(db: &Database, user_id: i64, title: &str) -> i64 {
        let channel = db.get_channel_by_slug("general").unwrap().unwrap();
        db.insert_thread(&NewThread {
            title: title.to_string(),
            url: Some("https://example.com".into()),
            channel_id: channel.id,
            user_id,
            ..Default::default()
        })
        .unwrap()
    }
}
