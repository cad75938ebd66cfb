use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ReactionKind;

// -- JWT Claims --

/// Signed identity claim carried in the `Authorization: Bearer` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Channels --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

// -- Threads --

/// Reaction type -> number of actors who left it.
pub type ReactionCounts = BTreeMap<ReactionKind, u64>;

/// A thread joined with its author and channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadView {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub tags: Option<String>,
    pub channel_id: i64,
    pub channel_name: String,
    pub channel_slug: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    #[serde(flatten)]
    pub thread: ThreadView,
    pub comment_count: u64,
    pub reactions: ReactionCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadDetail {
    #[serde(flatten)]
    pub thread: ThreadView,
    pub reactions: ReactionCounts,
    /// Every comment on the thread, top-level and replies, oldest first.
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Deserialize)]
pub struct ListThreadsQuery {
    pub channel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateThreadRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    /// Channel slug. Falls back to the server's default channel.
    #[serde(default)]
    pub channel: Option<String>,
}

/// Partial update: `None` keeps the stored value, an empty string clears
/// an optional field.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditThreadRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

/// Returned by thread create and edit.
#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub message: String,
    pub thread: ThreadView,
}

// -- Comments --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub thread_id: i64,
    pub user_id: i64,
    pub username: String,
    pub parent_id: Option<i64>,
    pub reply_count: u64,
    pub reactions: ReactionCounts,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub thread_id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentCreatedResponse {
    pub message: String,
    pub comment: CommentView,
}

// -- Reactions --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactionRequest {
    #[serde(default)]
    pub thread_id: Option<i64>,
    /// Takes precedence over `thread_id` when both are sent.
    #[serde(default)]
    pub comment_id: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<ReactionKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionAddedResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleReactionResponse {
    pub added: bool,
}

// -- Uploads --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: String,
}
