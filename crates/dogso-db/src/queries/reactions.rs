use anyhow::Result;
use rusqlite::Connection;

use dogso_types::models::{ReactionKey, ReactionTarget};

use super::{is_foreign_key_violation, is_unique_violation};
use crate::Database;
use crate::models::{ReactionInsert, ReactionToggle};

fn target_columns(key: &ReactionKey) -> (Option<i64>, Option<i64>) {
    match key.target() {
        ReactionTarget::Thread(id) => (Some(id), None),
        ReactionTarget::Comment(id) => (None, Some(id)),
    }
}

/// Plain INSERT. Duplicates are caught by the partial unique indexes and a
/// dangling target by the foreign keys, so concurrent duplicate requests
/// cannot both succeed.
fn insert(conn: &Connection, key: &ReactionKey) -> Result<ReactionInsert> {
    let (thread_id, comment_id) = target_columns(key);
    let inserted = conn.execute(
        "INSERT INTO reactions (actor, thread_id, comment_id, type) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![key.actor_key(), thread_id, comment_id, key.kind().as_str()],
    );

    match inserted {
        Ok(_) => Ok(ReactionInsert::Added(conn.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(ReactionInsert::AlreadyExists),
        Err(e) if is_foreign_key_violation(&e) => Ok(ReactionInsert::TargetMissing),
        Err(e) => Err(e.into()),
    }
}

fn delete(conn: &Connection, key: &ReactionKey) -> Result<bool> {
    let sql = match key.target() {
        ReactionTarget::Thread(_) => {
            "DELETE FROM reactions WHERE actor = ?1 AND thread_id = ?2 AND comment_id IS NULL AND type = ?3"
        }
        ReactionTarget::Comment(_) => {
            "DELETE FROM reactions WHERE actor = ?1 AND comment_id = ?2 AND thread_id IS NULL AND type = ?3"
        }
    };
    let target_id = match key.target() {
        ReactionTarget::Thread(id) | ReactionTarget::Comment(id) => id,
    };

    let deleted = conn.execute(
        sql,
        rusqlite::params![key.actor_key(), target_id, key.kind().as_str()],
    )?;
    Ok(deleted > 0)
}

impl Database {
    pub fn add_reaction(&self, key: &ReactionKey) -> Result<ReactionInsert> {
        self.with_conn(|conn| insert(conn, key))
    }

    /// Idempotent: removing an absent reaction is not an error.
    /// Returns whether a row was deleted.
    pub fn remove_reaction(&self, key: &ReactionKey) -> Result<bool> {
        self.with_conn(|conn| delete(conn, key))
    }

    /// Add the reaction, or remove it if it is already recorded, in one transaction.
    pub fn toggle_reaction(&self, key: &ReactionKey) -> Result<ReactionToggle> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let outcome = match insert(&tx, key)? {
                ReactionInsert::Added(id) => ReactionToggle::Added(id),
                ReactionInsert::TargetMissing => ReactionToggle::TargetMissing,
                ReactionInsert::AlreadyExists => {
                    delete(&tx, key)?;
                    ReactionToggle::Removed
                }
            };
            tx.commit()?;
            Ok(outcome)
        })
    }
}
