use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reaction types a client can attach to a thread or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Heart,
    Yellow,
    Red,
    /// Catch-all for anything else a client sends. Never stored.
    #[serde(other)]
    Unknown,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [Self::Like, Self::Heart, Self::Yellow, Self::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Heart => "heart",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .unwrap_or(Self::Unknown))
    }
}

/// Who is performing a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Authenticated { user_id: i64 },
    /// Unauthenticated caller, identified only by network origin.
    Anonymous { origin: String },
}

impl Actor {
    /// Value stored in `reactions.actor`. The prefixes keep user ids and
    /// origins from ever comparing equal.
    pub fn ledger_key(&self) -> String {
        match self {
            Self::Authenticated { user_id } => format!("user:{}", user_id),
            Self::Anonymous { origin } => format!("origin:{}", origin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTarget {
    Thread(i64),
    Comment(i64),
}

/// One reaction slot in the ledger: (actor, target, kind).
///
/// Comment reactions can only be built from a user id, so an anonymous
/// comment reaction is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionKey {
    Thread {
        actor: Actor,
        thread_id: i64,
        kind: ReactionKind,
    },
    Comment {
        user_id: i64,
        comment_id: i64,
        kind: ReactionKind,
    },
}

impl ReactionKey {
    /// Returns `None` when an anonymous actor targets a comment.
    pub fn new(actor: Actor, target: ReactionTarget, kind: ReactionKind) -> Option<Self> {
        match (target, actor) {
            (ReactionTarget::Thread(thread_id), actor) => Some(Self::Thread {
                actor,
                thread_id,
                kind,
            }),
            (ReactionTarget::Comment(comment_id), Actor::Authenticated { user_id }) => {
                Some(Self::Comment {
                    user_id,
                    comment_id,
                    kind,
                })
            }
            (ReactionTarget::Comment(_), Actor::Anonymous { .. }) => None,
        }
    }

    pub fn actor_key(&self) -> String {
        match self {
            Self::Thread { actor, .. } => actor.ledger_key(),
            Self::Comment { user_id, .. } => Actor::Authenticated { user_id: *user_id }.ledger_key(),
        }
    }

    pub fn target(&self) -> ReactionTarget {
        match self {
            Self::Thread { thread_id, .. } => ReactionTarget::Thread(*thread_id),
            Self::Comment { comment_id, .. } => ReactionTarget::Comment(*comment_id),
        }
    }

    pub fn kind(&self) -> ReactionKind {
        match self {
            Self::Thread { kind, .. } | Self::Comment { kind, .. } => *kind,
        }
    }
}

/// Where a comment sits in its thread. Replies only ever hang off a
/// top-level comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentPlacement {
    TopLevel,
    Reply { parent_id: i64 },
}

impl CommentPlacement {
    pub fn parent_id(&self) -> Option<i64> {
        match self {
            Self::TopLevel => None,
            Self::Reply { parent_id } => Some(*parent_id),
        }
    }
}
