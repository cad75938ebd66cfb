use anyhow::Result;
use rusqlite::{Connection, Row};

use super::{OptionalExt, ReactionScope, reaction_counts};
use crate::Database;
use crate::models::{
    CommentAggregate, CommentRow, NewThread, ThreadAggregate, ThreadChanges, ThreadDetailAggregate,
    ThreadJoinedRow, ThreadRow,
};

const THREAD_COLUMNS: &str = "t.id, t.title, t.subtitle, t.url, t.thumbnail, t.media_url, t.media_type,
     t.tags, t.channel_id, t.user_id, t.created_at, t.edited_at";

/// Joined select; columns 0..12 are the thread, then username, channel name, channel slug.
const THREAD_JOIN: &str = "FROM threads t
     JOIN users u ON t.user_id = u.id
     JOIN channels c ON t.channel_id = c.id";

fn thread_row(row: &Row<'_>) -> rusqlite::Result<ThreadRow> {
    Ok(ThreadRow {
        id: row.get(0)?,
        title: row.get(1)?,
        subtitle: row.get(2)?,
        url: row.get(3)?,
        thumbnail: row.get(4)?,
        media_url: row.get(5)?,
        media_type: row.get(6)?,
        tags: row.get(7)?,
        channel_id: row.get(8)?,
        user_id: row.get(9)?,
        created_at: row.get(10)?,
        edited_at: row.get(11)?,
    })
}

fn joined_row(row: &Row<'_>) -> rusqlite::Result<ThreadJoinedRow> {
    Ok(ThreadJoinedRow {
        thread: thread_row(row)?,
        username: row.get(12)?,
        channel_name: row.get(13)?,
        channel_slug: row.get(14)?,
    })
}

impl Database {
    pub fn insert_thread(&self, new: &NewThread) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO threads (title, subtitle, url, thumbnail, media_url, media_type, tags, channel_id, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    new.title,
                    new.subtitle,
                    new.url,
                    new.thumbnail,
                    new.media_url,
                    new.media_type,
                    new.tags,
                    new.channel_id,
                    new.user_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Bare thread row, used by the edit path for the ownership check.
    pub fn get_thread_row(&self, id: i64) -> Result<Option<ThreadRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM threads t WHERE t.id = ?1", THREAD_COLUMNS),
                [id],
                thread_row,
            )
            .optional()
        })
    }

    pub fn get_thread_view(&self, id: i64) -> Result<Option<ThreadJoinedRow>> {
        self.with_conn(|conn| query_joined_thread(conn, id))
    }

    /// Overwrite the mutable columns and stamp `edited_at`.
    /// Returns false if the thread does not exist.
    pub fn update_thread(&self, id: i64, changes: &ThreadChanges) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE threads
                 SET title = ?1, subtitle = ?2, url = ?3, thumbnail = ?4, media_url = ?5,
                     media_type = ?6, tags = ?7, edited_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?8",
                rusqlite::params![
                    changes.title,
                    changes.subtitle,
                    changes.url,
                    changes.thumbnail,
                    changes.media_url,
                    changes.media_type,
                    changes.tags,
                    id,
                ],
            )?;
            Ok(updated > 0)
        })
    }

    /// Thread list, newest first, optionally restricted to one channel.
    /// Each entry carries its total comment count (all depths) and its
    /// thread-level reaction counts.
    pub fn list_threads(&self, channel_slug: Option<&str>) -> Result<Vec<ThreadAggregate>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, u.username, c.name, c.slug,
                        (SELECT COUNT(*) FROM comments cm WHERE cm.thread_id = t.id)
                 {}
                 WHERE ?1 IS NULL OR c.slug = ?1
                 ORDER BY t.created_at DESC, t.id DESC",
                THREAD_COLUMNS, THREAD_JOIN
            ))?;

            let rows = stmt
                .query_map([channel_slug], |row| Ok((joined_row(row)?, row.get::<_, i64>(15)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut reactions = reaction_counts(conn, ReactionScope::Threads { channel_slug })?;

            Ok(rows
                .into_iter()
                .map(|(thread, comment_count)| ThreadAggregate {
                    reactions: reactions.remove(&thread.thread.id).unwrap_or_default(),
                    thread,
                    comment_count,
                })
                .collect())
        })
    }

    /// Thread with reaction counts and its full flat comment list, oldest
    /// comment first. Each comment carries its reply count and reactions.
    pub fn get_thread_detail(&self, id: i64) -> Result<Option<ThreadDetailAggregate>> {
        self.with_conn(|conn| {
            let Some(thread) = query_joined_thread(conn, id)? else {
                return Ok(None);
            };

            let mut thread_reactions = reaction_counts(conn, ReactionScope::Thread(id))?;

            let mut stmt = conn.prepare(
                "SELECT cm.id, cm.content, cm.thread_id, cm.user_id, u.username, cm.parent_id, cm.created_at,
                        (SELECT COUNT(*) FROM comments r WHERE r.parent_id = cm.id)
                 FROM comments cm
                 JOIN users u ON cm.user_id = u.id
                 WHERE cm.thread_id = ?1
                 ORDER BY cm.created_at ASC, cm.id ASC",
            )?;
            let rows = stmt
                .query_map([id], |row| {
                    Ok((
                        CommentRow {
                            id: row.get(0)?,
                            content: row.get(1)?,
                            thread_id: row.get(2)?,
                            user_id: row.get(3)?,
                            username: row.get(4)?,
                            parent_id: row.get(5)?,
                            created_at: row.get(6)?,
                        },
                        row.get::<_, i64>(7)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut comment_reactions = reaction_counts(conn, ReactionScope::CommentsOf(id))?;

            let comments = rows
                .into_iter()
                .map(|(comment, reply_count)| CommentAggregate {
                    reactions: comment_reactions.remove(&comment.id).unwrap_or_default(),
                    comment,
                    reply_count,
                })
                .collect();

            Ok(Some(ThreadDetailAggregate {
                thread,
                reactions: thread_reactions.remove(&id).unwrap_or_default(),
                comments,
            }))
        })
    }
}

fn query_joined_thread(conn: &Connection, id: i64) -> Result<Option<ThreadJoinedRow>> {
    conn.query_row(
        &format!(
            "SELECT {}, u.username, c.name, c.slug {} WHERE t.id = ?1",
            THREAD_COLUMNS, THREAD_JOIN
        ),
        [id],
        joined_row,
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReactionCountRow;
    use crate::queries::fixtures;
    use dogso_types::models::{Actor, ReactionKey, ReactionKind, ReactionTarget};

    fn anon(origin: &str) -> Actor {
        Actor::Anonymous {
            origin: origin.to_string(),
        }
    }

    #[test]
    fn list_is_newest_first_with_author_and_channel() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let first = fixtures::thread(&db, alice, "first");
        let second = fixtures::thread(&db, alice, "second");

        let list = db.list_threads(None).unwrap();
        let ids: Vec<i64> = list.iter().map(|t| t.thread.thread.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(list[0].thread.username, "alice");
        assert_eq!(list[0].thread.channel_slug, "general");
        assert_eq!(list[0].comment_count, 0);
        assert!(list[0].reactions.is_empty());
    }

    #[test]
    fn list_filters_by_channel_slug() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let reds = db.ensure_channel("Urawa Reds", "urawa-reds", None).unwrap();
        fixtures::thread(&db, alice, "general thread");
        let reds_thread = db
            .insert_thread(&NewThread {
                title: "match report".into(),
                url: Some("https://example.com/match".into()),
                channel_id: reds.id,
                user_id: alice,
                ..Default::default()
            })
            .unwrap();

        let list = db.list_threads(Some("urawa-reds")).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].thread.thread.id, reds_thread);
        assert!(db.list_threads(Some("nope")).unwrap().is_empty());
        assert_eq!(db.list_threads(None).unwrap().len(), 2);
    }

    #[test]
    fn comment_count_matches_detail_comments() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let bob = fixtures::user(&db, "bob");
        let thread = fixtures::thread(&db, alice, "t");

        let top = db.insert_comment(thread, alice, "top", None).unwrap();
        let top_id = match top {
            crate::models::CommentInsert::Created(c) => c.id,
            other => panic!("unexpected {:?}", other),
        };
        db.insert_comment(thread, bob, "reply", Some(top_id)).unwrap();
        db.insert_comment(thread, bob, "second top", None).unwrap();

        let listed = db.list_threads(None).unwrap();
        let detail = db.get_thread_detail(thread).unwrap().unwrap();
        assert_eq!(listed[0].comment_count, 3);
        assert_eq!(detail.comments.len() as i64, listed[0].comment_count);

        let first = &detail.comments[0];
        assert_eq!(first.comment.id, top_id);
        assert_eq!(first.reply_count, 1);
        assert_eq!(detail.comments[1].comment.parent_id, Some(top_id));
        assert_eq!(detail.comments[1].comment.username, "bob");
    }

    #[test]
    fn reactions_grouped_by_type() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let thread = fixtures::thread(&db, alice, "t");

        for (origin, kind) in [
            ("10.0.0.1", ReactionKind::Heart),
            ("10.0.0.2", ReactionKind::Heart),
            ("10.0.0.1", ReactionKind::Like),
        ] {
            let key = ReactionKey::new(anon(origin), ReactionTarget::Thread(thread), kind).unwrap();
            db.add_reaction(&key).unwrap();
        }

        let detail = db.get_thread_detail(thread).unwrap().unwrap();
        assert_eq!(
            detail.reactions,
            vec![
                ReactionCountRow { kind: "heart".into(), count: 2 },
                ReactionCountRow { kind: "like".into(), count: 1 },
            ]
        );
        let listed = db.list_threads(None).unwrap();
        assert_eq!(listed[0].reactions, detail.reactions);
    }

    #[test]
    fn comment_reactions_do_not_leak_into_thread_counts() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let thread = fixtures::thread(&db, alice, "t");
        let comment = match db.insert_comment(thread, alice, "hi", None).unwrap() {
            crate::models::CommentInsert::Created(c) => c.id,
            other => panic!("unexpected {:?}", other),
        };

        let key = ReactionKey::new(
            Actor::Authenticated { user_id: alice },
            ReactionTarget::Comment(comment),
            ReactionKind::Yellow,
        )
        .unwrap();
        db.add_reaction(&key).unwrap();

        let detail = db.get_thread_detail(thread).unwrap().unwrap();
        assert!(detail.reactions.is_empty());
        assert_eq!(
            detail.comments[0].reactions,
            vec![ReactionCountRow { kind: "yellow".into(), count: 1 }]
        );
    }

    #[test]
    fn update_overwrites_and_stamps_edited_at() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let thread = fixtures::thread(&db, alice, "before");
        assert!(db.get_thread_row(thread).unwrap().unwrap().edited_at.is_none());

        let changed = db
            .update_thread(
                thread,
                &ThreadChanges {
                    title: "after".into(),
                    subtitle: Some("sub".into()),
                    url: None,
                    thumbnail: None,
                    media_url: Some("/uploads/a.png".into()),
                    media_type: Some("image".into()),
                    tags: Some("a b".into()),
                },
            )
            .unwrap();
        assert!(changed);

        let row = db.get_thread_row(thread).unwrap().unwrap();
        assert_eq!(row.title, "after");
        assert_eq!(row.url, None);
        assert_eq!(row.media_type.as_deref(), Some("image"));
        assert!(row.edited_at.is_some());

        assert!(!db
            .update_thread(
                9999,
                &ThreadChanges {
                    title: "x".into(),
                    subtitle: None,
                    url: None,
                    thumbnail: None,
                    media_url: None,
                    media_type: None,
                    tags: None,
                }
            )
            .unwrap());
    }

    #[test]
    fn missing_thread_detail_is_none() {
        let db = fixtures::db();
        assert!(db.get_thread_detail(42).unwrap().is_none());
        assert!(db.get_thread_view(42).unwrap().is_none());
    }

    /// More rows than SQLite will bind as parameters in one statement.
    const PAST_PARAMETER_LIMIT: i64 = 33_000;

    fn bulk_insert(db: &Database, sql: &str, params: impl Fn(i64) -> (String, i64, i64)) {
        db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(sql)?;
                for i in 0..PAST_PARAMETER_LIMIT {
                    stmt.execute(params(i))?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn list_handles_more_threads_than_bind_parameters() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let general = db.get_channel_by_slug("general").unwrap().unwrap().id;
        bulk_insert(
            &db,
            "INSERT INTO threads (title, url, channel_id, user_id) VALUES (?1, 'https://example.com', ?2, ?3)",
            |i| (format!("thread {}", i), general, alice),
        );

        let liked = fixtures::thread(&db, alice, "liked");
        let key = ReactionKey::new(anon("10.0.0.1"), ReactionTarget::Thread(liked), ReactionKind::Heart).unwrap();
        db.add_reaction(&key).unwrap();

        for scope in [None, Some("general")] {
            let list = db.list_threads(scope).unwrap();
            assert_eq!(list.len() as i64, PAST_PARAMETER_LIMIT + 1);
            let entry = list.iter().find(|t| t.thread.thread.id == liked).unwrap();
            assert_eq!(entry.reactions, vec![ReactionCountRow { kind: "heart".into(), count: 1 }]);
            assert_eq!(list.iter().filter(|t| !t.reactions.is_empty()).count(), 1);
        }
    }

    #[test]
    fn detail_handles_more_comments_than_bind_parameters() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let thread = fixtures::thread(&db, alice, "busy");
        bulk_insert(
            &db,
            "INSERT INTO comments (content, thread_id, user_id) VALUES (?1, ?2, ?3)",
            |i| (format!("comment {}", i), thread, alice),
        );

        let liked = match db.insert_comment(thread, alice, "liked", None).unwrap() {
            crate::models::CommentInsert::Created(c) => c.id,
            other => panic!("unexpected {:?}", other),
        };
        let key = ReactionKey::new(
            Actor::Authenticated { user_id: alice },
            ReactionTarget::Comment(liked),
            ReactionKind::Like,
        )
        .unwrap();
        db.add_reaction(&key).unwrap();

        let detail = db.get_thread_detail(thread).unwrap().unwrap();
        assert_eq!(detail.comments.len() as i64, PAST_PARAMETER_LIMIT + 1);
        let entry = detail.comments.iter().find(|c| c.comment.id == liked).unwrap();
        assert_eq!(entry.reactions, vec![ReactionCountRow { kind: "like".into(), count: 1 }]);
        assert!(detail.reactions.is_empty());
    }

    #[test]
    fn reaction_counts_stay_within_their_scope() {
        let db = fixtures::db();
        let alice = fixtures::user(&db, "alice");
        let reds = db.ensure_channel("Urawa Reds", "urawa-reds", None).unwrap();
        let general_thread = fixtures::thread(&db, alice, "general");
        let reds_thread = db
            .insert_thread(&NewThread {
                title: "match report".into(),
                url: Some("https://example.com/match".into()),
                channel_id: reds.id,
                user_id: alice,
                ..Default::default()
            })
            .unwrap();
        for thread in [general_thread, reds_thread] {
            let key = ReactionKey::new(anon("10.0.0.1"), ReactionTarget::Thread(thread), ReactionKind::Red).unwrap();
            db.add_reaction(&key).unwrap();
        }

        let channel_counts = db
            .with_conn(|conn| reaction_counts(conn, ReactionScope::Threads { channel_slug: Some("urawa-reds") }))
            .unwrap();
        assert_eq!(channel_counts.keys().copied().collect::<Vec<_>>(), vec![reds_thread]);

        let other_thread = db
            .with_conn(|conn| reaction_counts(conn, ReactionScope::CommentsOf(general_thread)))
            .unwrap();
        assert!(other_thread.is_empty());
    }
}
