//! Relationship rows written by a commit

use psdb_common::Result;
use sqlx::SqliteConnection;

pub async fn link_album_song(conn: &mut SqliteConnection, album_id: i64, song_id: i64) -> Result<()> {
    sqlx::query("INSERT INTO album_songs (album_id, song_id) VALUES (?, ?)")
        .bind(album_id)
        .bind(song_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn link_song_artist(
    conn: &mut SqliteConnection,
    song_id: i64,
    artist_id: i64,
    role: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO song_artists (song_id, artist_id, role) VALUES (?, ?, ?)")
        .bind(song_id)
        .bind(artist_id)
        .bind(role)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Link a preset to its synth; an existing link is left alone
pub async fn link_preset_synth(
    conn: &mut SqliteConnection,
    preset_id: i64,
    synth_id: i64,
) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO preset_synths (preset_id, synth_id) VALUES (?, ?)")
        .bind(preset_id)
        .bind(synth_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// One use of a preset in a song
#[derive(Debug, Clone)]
pub struct SongPresetUsage<'a> {
    pub song_id: i64,
    pub preset_id: i64,
    pub usage_type: &'a str,
    pub verified: bool,
    pub audio: Option<&'a str>,
    pub timestamp: &'a str,
}

/// Insert a song_presets row, returning its id
pub async fn insert_song_preset(
    conn: &mut SqliteConnection,
    usage: &SongPresetUsage<'_>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO song_presets (song_id, preset_id, usage_type, verified, audio_url, timestamp)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(usage.song_id)
    .bind(usage.preset_id)
    .bind(usage.usage_type)
    .bind(if usage.verified { "t" } else { "f" })
    .bind(usage.audio)
    .bind(usage.timestamp)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Attribute a song_presets row to the user who submitted it
pub async fn insert_user_submission(
    conn: &mut SqliteConnection,
    user_id: i64,
    song_preset_id: i64,
) -> Result<()> {
    sqlx::query("INSERT INTO user_submissions (user_id, song_preset_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(song_preset_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
