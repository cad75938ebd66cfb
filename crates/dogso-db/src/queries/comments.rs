use anyhow::Result;
use rusqlite::Connection;
use tracing::debug;

use dogso_types::models::CommentPlacement;

use super::OptionalExt;
use crate::Database;
use crate::models::{CommentInsert, CommentRow};

impl Database {
    /// Insert a comment, top-level or reply.
    ///
    /// Replies are kept one level deep: a `parent_id` naming a reply is
    /// rewritten to that reply's own top-level parent. The parent lookup and
    /// the insert share one transaction.
    pub fn insert_comment(
        &self,
        thread_id: i64,
        user_id: i64,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<CommentInsert> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let thread_exists = tx
                .query_row("SELECT 1 FROM threads WHERE id = ?1", [thread_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !thread_exists {
                return Ok(CommentInsert::ThreadMissing);
            }

            let placement = match parent_id {
                None => CommentPlacement::TopLevel,
                Some(requested) => match resolve_parent(&tx, thread_id, requested)? {
                    Some(placement) => placement,
                    None => return Ok(CommentInsert::ParentMissing),
                },
            };

            tx.execute(
                "INSERT INTO comments (content, thread_id, user_id, parent_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![content, thread_id, user_id, placement.parent_id()],
            )?;
            let id = tx.last_insert_rowid();
            let row = query_comment(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("Comment {} vanished after insert", id))?;

            tx.commit()?;
            Ok(CommentInsert::Created(row))
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| query_comment(conn, id))
    }
}

/// Where a reply to `requested` actually lands, or `None` if `requested` is
/// not a comment on `thread_id`.
fn resolve_parent(conn: &Connection, thread_id: i64, requested: i64) -> Result<Option<CommentPlacement>> {
    let parent: Option<(i64, Option<i64>)> = conn
        .query_row(
            "SELECT thread_id, parent_id FROM comments WHERE id = ?1",
            [requested],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let placement = match parent {
        Some((parent_thread, _)) if parent_thread != thread_id => None,
        None => None,
        Some((_, None)) => Some(CommentPlacement::Reply { parent_id: requested }),
        Some((_, Some(grandparent))) => {
            debug!(
                "Flattening reply to reply {} onto top-level comment {}",
                requested, grandparent
            );
            Some(CommentPlacement::Reply { parent_id: grandparent })
        }
    };
    Ok(placement)
}

fn query_comment(conn: &Connection, id: i64) -> Result<Option<CommentRow>> {
    conn.query_row(
        "SELECT cm.id, cm.content, cm.thread_id, cm.user_id, u.username, cm.parent_id, cm.created_at
         FROM comments cm
         JOIN users u ON cm.user_id = u.id
         WHERE cm.id = ?1",
        [id],
        |row| {
            Ok(CommentRow {
                id: row.get(0)?,
                content: row.get(1)?,
                thread_id: row.get(2)?,
                user_id: row.get(3)?,
                username: row.get(4)?,
                parent_id: row.get(5)?,
                created_at: row.get(6)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    fn created(insert: CommentInsert) -> CommentRow {
        match insert {
            CommentInsert::Created(row) => row,
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn top_level_and_reply() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let bob = fixtures::user(&db, "bob");
        let thread = fixtures::thread(&db, alice, "t");

        let c1 = created(db.insert_comment(thread, alice, "first", None).unwrap());
        assert_eq!(c1.parent_id, None);
        assert_eq!(c1.username, "alice");

        let c2 = created(db.insert_comment(thread, bob, "reply", Some(c1.id)).unwrap());
        assert_eq!(c2.parent_id, Some(c1.id));
        assert_eq!(c2.thread_id, thread);
    }

    #[test]
    fn reply_to_reply_is_flattened() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let thread = fixtures::thread(&db, alice, "t");

        let top = created(db.insert_comment(thread, alice, "top", None).unwrap());
        let reply = created(db.insert_comment(thread, alice, "reply", Some(top.id)).unwrap());
        let nested = created(db.insert_comment(thread, alice, "nested", Some(reply.id)).unwrap());

        assert_eq!(nested.parent_id, Some(top.id));

        // every parent reachable from the tree view is top-level
        let detail = db.get_thread_detail(thread).unwrap().unwrap();
        for c in &detail.comments {
            if let Some(parent_id) = c.comment.parent_id {
                let parent = db.get_comment(parent_id).unwrap().unwrap();
                assert_eq!(parent.parent_id, None);
            }
        }
        let top_entry = detail.comments.iter().find(|c| c.comment.id == top.id).unwrap();
        assert_eq!(top_entry.reply_count, 2);
    }

    #[test]
    fn missing_thread_or_foreign_parent_rejected() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let t1 = fixtures::thread(&db, alice, "one");
        let t2 = fixtures::thread(&db, alice, "two");
        let on_t1 = created(db.insert_comment(t1, alice, "c", None).unwrap());

        assert!(matches!(
            db.insert_comment(999, alice, "c", None).unwrap(),
            CommentInsert::ThreadMissing
        ));
        assert!(matches!(
            db.insert_comment(t2, alice, "c", Some(on_t1.id)).unwrap(),
            CommentInsert::ParentMissing
        ));
        assert!(matches!(
            db.insert_comment(t2, alice, "c", Some(12345)).unwrap(),
            CommentInsert::ParentMissing
        ));
        assert_eq!(db.get_thread_detail(t2).unwrap().unwrap().comments.len(), 0);
    }
}
