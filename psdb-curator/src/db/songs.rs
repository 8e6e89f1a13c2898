//! Song lookups and inserts

use super::Resolved;
use crate::models::SongEntry;
use psdb_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Canonical song row
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: i64,
    pub title: String,
    pub genre: String,
    pub year: Option<i32>,
    pub url: String,
    pub img: Option<String>,
}

fn from_row(row: &SqliteRow) -> Song {
    Song {
        song_id: row.get("song_id"),
        title: row.get("song_title"),
        genre: row.get("song_genre"),
        year: row.get("release_year"),
        url: row.get("song_url"),
        img: row.get("song_img"),
    }
}

/// Find a song by natural key (title, release year)
pub async fn find_song(
    conn: &mut SqliteConnection,
    title: &str,
    year: Option<i32>,
) -> Result<Option<Song>> {
    let row = sqlx::query(
        r#"
        SELECT song_id, song_title, song_genre, release_year, song_url, song_img
        FROM songs
        WHERE song_title = ? AND IFNULL(release_year, 0) = IFNULL(?, 0)
        "#,
    )
    .bind(title)
    .bind(year)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(from_row))
}

pub async fn find_or_create_song(
    conn: &mut SqliteConnection,
    song: &SongEntry,
) -> Result<Resolved<Song>> {
    if let Some(existing) = find_song(conn, &song.title, song.year).await? {
        return Ok(Resolved::existing(existing));
    }

    let inserted = sqlx::query(
        r#"
        INSERT OR IGNORE INTO songs (song_title, song_genre, release_year, song_url, song_img)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&song.title)
    .bind(&song.genre)
    .bind(song.year)
    .bind(&song.url)
    .bind(&song.img)
    .execute(&mut *conn)
    .await?;

    let reread = find_song(conn, &song.title, song.year).await?;
    Resolved::after_insert(inserted.rows_affected(), reread, "song")
}
