//! Album lookups and inserts

use super::Resolved;
use crate::models::AlbumEntry;
use psdb_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Album id linked to songs that are singles
pub const SINGLE_ALBUM_ID: i64 = 0;

/// Canonical album row
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub album_id: i64,
    pub title: String,
    pub genre: String,
    pub year: Option<i32>,
    pub img: Option<String>,
}

fn from_row(row: &SqliteRow) -> Album {
    Album {
        album_id: row.get("album_id"),
        title: row.get("album_title"),
        genre: row.get("album_genre"),
        year: row.get("release_year"),
        img: row.get("album_img"),
    }
}

/// Find an album by natural key (title, release year)
pub async fn find_album(
    conn: &mut SqliteConnection,
    title: &str,
    year: Option<i32>,
) -> Result<Option<Album>> {
    let row = sqlx::query(
        r#"
        SELECT album_id, album_title, album_genre, release_year, album_img
        FROM albums
        WHERE album_title = ? AND IFNULL(release_year, 0) = IFNULL(?, 0)
        "#,
    )
    .bind(title)
    .bind(year)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(from_row))
}

pub async fn find_or_create_album(
    conn: &mut SqliteConnection,
    album: &AlbumEntry,
) -> Result<Resolved<Album>> {
    if let Some(existing) = find_album(conn, &album.title, album.year).await? {
        return Ok(Resolved::existing(existing));
    }

    let inserted = sqlx::query(
        r#"
        INSERT OR IGNORE INTO albums (album_title, album_genre, release_year, album_img)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&album.title)
    .bind(&album.genre)
    .bind(album.year)
    .bind(&album.img)
    .execute(&mut *conn)
    .await?;

    let reread = find_album(conn, &album.title, album.year).await?;
    Resolved::after_insert(inserted.rows_affected(), reread, "album")
}
