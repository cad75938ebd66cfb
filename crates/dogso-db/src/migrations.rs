use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Default channel seeded by the first migration.
pub const DEFAULT_CHANNEL_SLUG: &str = "general";

pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        let tx = conn.transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE channels (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                slug        TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE threads (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                subtitle    TEXT,
                url         TEXT,
                thumbnail   TEXT,
                media_url   TEXT,
                media_type  TEXT,
                tags        TEXT,
                channel_id  INTEGER NOT NULL REFERENCES channels(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                edited_at   TEXT
            );

            CREATE INDEX idx_threads_channel
                ON threads(channel_id, created_at);

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                content     TEXT NOT NULL,
                thread_id   INTEGER NOT NULL REFERENCES threads(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                parent_id   INTEGER REFERENCES comments(id),
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_comments_thread
                ON comments(thread_id, created_at);

            CREATE INDEX idx_comments_parent
                ON comments(parent_id);

            -- actor is 'user:<id>' or 'origin:<addr>'
            CREATE TABLE reactions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                actor       TEXT NOT NULL,
                thread_id   INTEGER REFERENCES threads(id),
                comment_id  INTEGER REFERENCES comments(id),
                type        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                CHECK ((thread_id IS NULL) <> (comment_id IS NULL))
            );

            -- NULLs are distinct in a plain UNIQUE, so each target kind gets
            -- its own partial index over non-null columns only.
            CREATE UNIQUE INDEX idx_reactions_thread_actor
                ON reactions(actor, thread_id, type) WHERE comment_id IS NULL;

            CREATE UNIQUE INDEX idx_reactions_comment_actor
                ON reactions(actor, comment_id, type) WHERE thread_id IS NULL;

            INSERT INTO channels (name, slug, description)
                VALUES ('General', 'general', 'Everything else');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}
