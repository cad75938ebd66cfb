use anyhow::Result;
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::ChannelRow;

const CHANNEL_COLUMNS: &str = "id, name, slug, description, created_at";

fn channel_row(row: &Row<'_>) -> rusqlite::Result<ChannelRow> {
    Ok(ChannelRow {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    pub fn list_channels(&self) -> Result<Vec<ChannelRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {} FROM channels ORDER BY id ASC", CHANNEL_COLUMNS))?;
            let rows = stmt
                .query_map([], channel_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_channel_by_slug(&self, slug: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM channels WHERE slug = ?1", CHANNEL_COLUMNS),
                [slug],
                channel_row,
            )
            .optional()
        })
    }

    /// Create a channel unless one with this slug already exists. Channels
    /// have no HTTP write surface; the server seeds them at startup.
    pub fn ensure_channel(&self, name: &str, slug: &str, description: Option<&str>) -> Result<ChannelRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO channels (name, slug, description) VALUES (?1, ?2, ?3)",
                (name, slug, description),
            )?;
            // The insert is also skipped when only the name is taken, which
            // leaves no row under this slug.
            conn.query_row(
                &format!("SELECT {} FROM channels WHERE slug = ?1", CHANNEL_COLUMNS),
                [slug],
                channel_row,
            )
            .optional()?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Cannot create channel '{}': the name '{}' is already used by another slug",
                    slug,
                    name
                )
            })
        })
    }
}
