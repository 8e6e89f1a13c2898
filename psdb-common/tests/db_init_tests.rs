//! Tests for database initialization
//!
//! Covers first-run creation, idempotent re-initialization and the natural-key
//! indexes the curator's find-or-create logic depends on.

use psdb_common::db::init::init_database;
use tempfile::TempDir;

const EXPECTED_TABLES: &[&str] = &[
    "album_songs",
    "albums",
    "artists",
    "file_operations",
    "pending_submissions",
    "preset_synths",
    "presets",
    "song_artists",
    "song_presets",
    "songs",
    "synths",
    "user_submissions",
];

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("psdb.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_all_tables_created() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("psdb.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(tables, EXPECTED_TABLES);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("psdb.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO artists (artist_name, country) VALUES ('Boards of Canada', 'UK')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    // Second open must keep existing rows
    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_artist_natural_key_is_unique() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("psdb.db")).await.unwrap();

    sqlx::query("INSERT INTO artists (artist_name, country) VALUES ('Boards of Canada', 'UK')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate =
        sqlx::query("INSERT INTO artists (artist_name, country) VALUES ('Boards of Canada', 'UK')")
            .execute(&pool)
            .await;
    assert!(duplicate.is_err(), "Duplicate natural key must be rejected");

    // Same name in another country is a different artist
    sqlx::query("INSERT INTO artists (artist_name, country) VALUES ('Boards of Canada', 'CA')")
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_song_natural_key_treats_missing_year_as_one_value() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("psdb.db")).await.unwrap();

    sqlx::query("INSERT INTO songs (song_title, release_year) VALUES ('Roygbiv', NULL)")
        .execute(&pool)
        .await
        .unwrap();

    let ignored = sqlx::query("INSERT OR IGNORE INTO songs (song_title, release_year) VALUES ('Roygbiv', NULL)")
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(ignored.rows_affected(), 0);
}

#[tokio::test]
async fn test_presets_are_scoped_per_synth() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("psdb.db")).await.unwrap();

    sqlx::query("INSERT INTO synths (synth_id, synth_name, manufacturer) VALUES (1, 'Juno-60', 'Roland'), (2, 'Prophet-5', 'Sequential')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("INSERT INTO presets (synth_id, preset_name, pack_name, author) VALUES (1, 'Brass 1', 'Factory', 'Roland')")
        .execute(&pool)
        .await
        .unwrap();

    // Same preset identity on another synth is allowed
    sqlx::query("INSERT INTO presets (synth_id, preset_name, pack_name, author) VALUES (2, 'Brass 1', 'Factory', 'Roland')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate = sqlx::query("INSERT INTO presets (synth_id, preset_name, pack_name, author) VALUES (1, 'Brass 1', 'Factory', 'Roland')")
        .execute(&pool)
        .await;
    assert!(duplicate.is_err());
}
