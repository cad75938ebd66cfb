/// Database row types. These map directly to SQLite rows.
/// Distinct from dogso-types API models to keep the DB layer independent.
/// Timestamps are RFC 3339 strings as written by SQLite's `strftime`.

#[derive(Debug)]
pub struct ChannelRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: String,
}

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ThreadRow {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub tags: Option<String>,
    pub channel_id: i64,
    pub user_id: i64,
    pub created_at: String,
    pub edited_at: Option<String>,
}

/// A thread joined with its author and channel.
#[derive(Debug, Clone)]
pub struct ThreadJoinedRow {
    pub thread: ThreadRow,
    pub username: String,
    pub channel_name: String,
    pub channel_slug: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub thread_id: i64,
    pub user_id: i64,
    pub username: String,
    pub parent_id: Option<i64>,
    pub created_at: String,
}

/// One `GROUP BY type` bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCountRow {
    pub kind: String,
    pub count: i64,
}

/// Thread list entry.
pub struct ThreadAggregate {
    pub thread: ThreadJoinedRow,
    pub comment_count: i64,
    pub reactions: Vec<ReactionCountRow>,
}

pub struct CommentAggregate {
    pub comment: CommentRow,
    pub reply_count: i64,
    pub reactions: Vec<ReactionCountRow>,
}

pub struct ThreadDetailAggregate {
    pub thread: ThreadJoinedRow,
    pub reactions: Vec<ReactionCountRow>,
    pub comments: Vec<CommentAggregate>,
}

/// Column values for a new thread.
#[derive(Debug, Clone, Default)]
pub struct NewThread {
    pub title: String,
    pub subtitle: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub tags: Option<String>,
    pub channel_id: i64,
    pub user_id: i64,
}

/// Full replacement values for the mutable columns of a thread.
#[derive(Debug, Clone)]
pub struct ThreadChanges {
    pub title: String,
    pub subtitle: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub tags: Option<String>,
}

// -- Write outcomes --

pub enum UserInsert {
    Created(UserRow),
    /// Username or email already registered.
    Taken,
}

#[derive(Debug)]
pub enum CommentInsert {
    Created(CommentRow),
    ThreadMissing,
    /// Parent does not exist or belongs to another thread.
    ParentMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionInsert {
    Added(i64),
    AlreadyExists,
    TargetMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionToggle {
    Added(i64),
    Removed,
    TargetMissing,
}
