//! Artist lookups and inserts

use super::Resolved;
use crate::models::ArtistEntry;
use psdb_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Canonical artist row
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: i64,
    pub name: String,
    pub country: String,
    pub img: Option<String>,
}

fn from_row(row: &SqliteRow) -> Artist {
    Artist {
        artist_id: row.get("artist_id"),
        name: row.get("artist_name"),
        country: row.get("country"),
        img: row.get("artist_img"),
    }
}

/// Find an artist by natural key (name, country)
pub async fn find_artist(
    conn: &mut SqliteConnection,
    name: &str,
    country: &str,
) -> Result<Option<Artist>> {
    let row = sqlx::query(
        "SELECT artist_id, artist_name, country, artist_img FROM artists WHERE artist_name = ? AND country = ?",
    )
    .bind(name)
    .bind(country)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(from_row))
}

pub async fn find_or_create_artist(
    conn: &mut SqliteConnection,
    artist: &ArtistEntry,
) -> Result<Resolved<Artist>> {
    if let Some(existing) = find_artist(conn, &artist.name, &artist.country).await? {
        return Ok(Resolved::existing(existing));
    }

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO artists (artist_name, country, artist_img) VALUES (?, ?, ?)",
    )
    .bind(&artist.name)
    .bind(&artist.country)
    .bind(&artist.img)
    .execute(&mut *conn)
    .await?;

    let reread = find_artist(conn, &artist.name, &artist.country).await?;
    Resolved::after_insert(inserted.rows_affected(), reread, "artist")
}
