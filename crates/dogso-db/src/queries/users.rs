use anyhow::Result;
use rusqlite::Connection;

use super::{OptionalExt, is_unique_violation};
use crate::Database;
use crate::models::{UserInsert, UserRow};

impl Database {
    /// Insert a user. Duplicate username or email is reported as
    /// `UserInsert::Taken` by the UNIQUE constraints, not a prior lookup.
    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<UserInsert> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(UserInsert::Taken),
                Err(e) => return Err(e.into()),
            }

            let id = conn.last_insert_rowid();
            let row = query_user(conn, "id = ?1", id)?
                .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", id))?;
            Ok(UserInsert::Created(row))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, filter: &str, value: P) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, email, password, created_at FROM users WHERE {}",
        filter
    ))?;

    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            created_at: row.get(4)?,
        })
    })
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn duplicate_username_or_email_is_taken() {
        let db = fixtures::db();
        assert!(matches!(
            db.create_user("alice", "alice@example.com", "h").unwrap(),
            UserInsert::Created(_)
        ));
        assert!(matches!(
            db.create_user("alice", "other@example.com", "h").unwrap(),
            UserInsert::Taken
        ));
        assert!(matches!(
            db.create_user("bob", "alice@example.com", "h").unwrap(),
            UserInsert::Taken
        ));
    }

    #[test]
    fn lookup_by_email() {
        let db = fixtures::db();
        let id = fixtures::user(&db, "carol");

        let by_email = db.get_user_by_email("carol@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert_eq!(by_email.username, "carol");
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }
}
