//! Row -> API view conversions.

use chrono::{DateTime, Utc};
use tracing::warn;

use dogso_db::models::{ChannelRow, CommentAggregate, CommentRow, ReactionCountRow, ThreadJoinedRow};
use dogso_types::api::{ChannelResponse, CommentView, ReactionCounts, ThreadView};
use dogso_types::models::ReactionKind;

pub fn parse_timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written without strftime (e.g. by hand in sqlite3) use
            // "YYYY-MM-DD HH:MM:SS" with no zone.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, what, e);
            DateTime::default()
        })
}

pub fn reaction_counts(rows: Vec<ReactionCountRow>) -> ReactionCounts {
    let mut counts = ReactionCounts::new();
    for row in rows {
        let Ok(kind) = row.kind.parse::<ReactionKind>();
        if !kind.is_known() {
            warn!("Skipping stored reaction of unknown type '{}'", row.kind);
            continue;
        }
        *counts.entry(kind).or_default() += row.count.max(0) as u64;
    }
    counts
}

pub fn channel_view(row: ChannelRow) -> ChannelResponse {
    ChannelResponse {
        created_at: parse_timestamp(&row.created_at, "channel"),
        id: row.id,
        name: row.name,
        slug: row.slug,
        description: row.description,
    }
}

pub fn thread_view(row: ThreadJoinedRow) -> ThreadView {
    let t = row.thread;
    ThreadView {
        created_at: parse_timestamp(&t.created_at, "thread"),
        edited_at: t.edited_at.as_deref().map(|raw| parse_timestamp(raw, "thread edit")),
        id: t.id,
        title: t.title,
        subtitle: t.subtitle,
        url: t.url,
        thumbnail: t.thumbnail,
        media_url: t.media_url,
        media_type: t.media_type,
        tags: t.tags,
        channel_id: t.channel_id,
        channel_name: row.channel_name,
        channel_slug: row.channel_slug,
        user_id: t.user_id,
        username: row.username,
    }
}

pub fn comment_view(row: CommentRow, reply_count: i64, reactions: ReactionCounts) -> CommentView {
    CommentView {
        created_at: parse_timestamp(&row.created_at, "comment"),
        id: row.id,
        content: row.content,
        thread_id: row.thread_id,
        user_id: row.user_id,
        username: row.username,
        parent_id: row.parent_id,
        reply_count: reply_count.max(0) as u64,
        reactions,
    }
}

pub fn comment_aggregate_view(agg: CommentAggregate) -> CommentView {
    comment_view(agg.comment, agg.reply_count, reaction_counts(agg.reactions))
}
