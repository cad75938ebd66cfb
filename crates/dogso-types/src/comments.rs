//! Grouping of the flat comment list returned with a thread detail.

use std::collections::HashMap;

use serde::Serialize;

use crate::api::CommentView;

/// A top-level comment with its direct replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

/// Splits a thread's comments into top-level comments with their replies
/// attached. Input order is kept within each level. Replies whose parent is
/// not a top-level comment in `comments` are dropped, since the tree is
/// exactly two levels deep.
pub fn partition(comments: Vec<CommentView>) -> Vec<CommentNode> {
    let (top_level, replies): (Vec<_>, Vec<_>) =
        comments.into_iter().partition(|c| c.parent_id.is_none());

    let mut by_parent: HashMap<i64, Vec<CommentView>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            CommentNode { comment, replies }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(id: i64, parent_id: Option<i64>) -> CommentView {
        CommentView {
            id,
            content: format!("comment {}", id),
            thread_id: 1,
            user_id: 1,
            username: "alice".into(),
            parent_id,
            reply_count: 0,
            reactions: Default::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn groups_replies_under_parents() {
        let nodes = partition(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, None),
            comment(4, Some(1)),
        ]);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].comment.id, 1);
        let reply_ids: Vec<i64> = nodes[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(reply_ids, vec![2, 4]);
        assert!(nodes[1].replies.is_empty());
    }

    #[test]
    fn drops_replies_to_replies() {
        let nodes = partition(vec![comment(1, None), comment(2, Some(1)), comment(3, Some(2))]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].replies.len(), 1);
    }
}
