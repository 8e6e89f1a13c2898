//! Database initialization
//!
//! Creates the database on first run and brings every table up to the
//! current schema. All statements are idempotent, so `init_database` is safe
//! to call on every startup.
//!
//! Canonical tables carry a unique index on their natural key. Creation code
//! relies on those indexes (`INSERT OR IGNORE` followed by a re-read) instead
//! of an unguarded check-then-insert.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database at `db_path` and initialize the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table and index used by the curator
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Canonical entities
    create_songs_table(pool).await?;
    create_albums_table(pool).await?;
    create_artists_table(pool).await?;
    create_synths_table(pool).await?;
    create_presets_table(pool).await?;

    // Relationship tables
    create_album_songs_table(pool).await?;
    create_song_artists_table(pool).await?;
    create_preset_synths_table(pool).await?;
    create_song_presets_table(pool).await?;
    create_user_submissions_table(pool).await?;

    // Submission workflow
    create_pending_submissions_table(pool).await?;
    create_file_operations_table(pool).await?;

    Ok(())
}

/// Songs, unique on (title, release year)
pub async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_title TEXT NOT NULL,
            song_genre TEXT NOT NULL DEFAULT '',
            release_year INTEGER,
            song_url TEXT NOT NULL DEFAULT '',
            song_img TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_songs_natural_key ON songs(song_title, IFNULL(release_year, 0))",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Albums, unique on (title, release year)
pub async fn create_albums_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS albums (
            album_id INTEGER PRIMARY KEY AUTOINCREMENT,
            album_title TEXT NOT NULL,
            album_genre TEXT NOT NULL DEFAULT '',
            release_year INTEGER,
            album_img TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_albums_natural_key ON albums(album_title, IFNULL(release_year, 0))",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Artists, unique on (name, country)
pub async fn create_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            artist_id INTEGER PRIMARY KEY AUTOINCREMENT,
            artist_name TEXT NOT NULL,
            country TEXT NOT NULL DEFAULT '',
            artist_img TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (artist_name, country)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Synths, unique on (name, manufacturer)
pub async fn create_synths_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS synths (
            synth_id INTEGER PRIMARY KEY AUTOINCREMENT,
            synth_name TEXT NOT NULL,
            manufacturer TEXT NOT NULL DEFAULT '',
            synth_type TEXT NOT NULL DEFAULT '',
            release_year INTEGER,
            synth_img TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (synth_name, manufacturer)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Presets, scoped to their owning synth
///
/// A preset name is only unique within a synth, so the natural key is
/// (synth, name, pack, author).
pub async fn create_presets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS presets (
            preset_id INTEGER PRIMARY KEY AUTOINCREMENT,
            synth_id INTEGER NOT NULL REFERENCES synths(synth_id) ON DELETE CASCADE,
            preset_name TEXT NOT NULL,
            pack_name TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (synth_id, preset_name, pack_name, author)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Song to album links
///
/// `album_id` is 0 for singles, so it carries no foreign key.
pub async fn create_album_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS album_songs (
            album_song_id INTEGER PRIMARY KEY AUTOINCREMENT,
            album_id INTEGER NOT NULL,
            song_id INTEGER NOT NULL REFERENCES songs(song_id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_song_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_artists (
            song_artist_id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(song_id) ON DELETE CASCADE,
            artist_id INTEGER NOT NULL REFERENCES artists(artist_id) ON DELETE CASCADE,
            role TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_preset_synths_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS preset_synths (
            preset_id INTEGER NOT NULL REFERENCES presets(preset_id) ON DELETE CASCADE,
            synth_id INTEGER NOT NULL REFERENCES synths(synth_id) ON DELETE CASCADE,
            PRIMARY KEY (preset_id, synth_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Preset usage in a song
pub async fn create_song_presets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_presets (
            song_preset_id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(song_id) ON DELETE CASCADE,
            preset_id INTEGER NOT NULL REFERENCES presets(preset_id) ON DELETE CASCADE,
            usage_type TEXT NOT NULL DEFAULT '',
            verified TEXT NOT NULL DEFAULT 'f',
            audio_url TEXT,
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Attribution of song_presets rows to submitting users
///
/// Users live in the authentication service, so `user_id` carries no foreign key.
pub async fn create_user_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_submissions (
            user_submission_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            song_preset_id INTEGER NOT NULL REFERENCES song_presets(song_preset_id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Submissions awaiting admin review, stored as an opaque JSON document
pub async fn create_pending_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pending_submissions (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            user_id INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Journal of file promotions/discards recorded inside the transaction that
/// made them necessary, executed after commit
pub async fn create_file_operations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS file_operations (
            op_id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_kind TEXT NOT NULL CHECK (file_kind IN ('image', 'audio')),
            file_name TEXT NOT NULL,
            action TEXT NOT NULL CHECK (action IN ('promote', 'discard')),
            attempts INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
