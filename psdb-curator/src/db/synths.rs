//! Synth lookups and inserts

use super::Resolved;
use crate::models::SynthEntry;
use psdb_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Canonical synth row
#[derive(Debug, Clone, PartialEq)]
pub struct Synth {
    pub synth_id: i64,
    pub name: String,
    pub manufacturer: String,
    pub synth_type: String,
    pub year: Option<i32>,
    pub img: Option<String>,
}

fn from_row(row: &SqliteRow) -> Synth {
    Synth {
        synth_id: row.get("synth_id"),
        name: row.get("synth_name"),
        manufacturer: row.get("manufacturer"),
        synth_type: row.get("synth_type"),
        year: row.get("release_year"),
        img: row.get("synth_img"),
    }
}

/// Find a synth by natural key (name, manufacturer)
pub async fn find_synth(
    conn: &mut SqliteConnection,
    name: &str,
    manufacturer: &str,
) -> Result<Option<Synth>> {
    let row = sqlx::query(
        r#"
        SELECT synth_id, synth_name, manufacturer, synth_type, release_year, synth_img
        FROM synths
        WHERE synth_name = ? AND manufacturer = ?
        "#,
    )
    .bind(name)
    .bind(manufacturer)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(from_row))
}

pub async fn find_or_create_synth(
    conn: &mut SqliteConnection,
    synth: &SynthEntry,
) -> Result<Resolved<Synth>> {
    if let Some(existing) = find_synth(conn, &synth.name, &synth.manufacturer).await? {
        return Ok(Resolved::existing(existing));
    }

    let inserted = sqlx::query(
        r#"
        INSERT OR IGNORE INTO synths (synth_name, manufacturer, synth_type, release_year, synth_img)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&synth.name)
    .bind(&synth.manufacturer)
    .bind(&synth.synth_type)
    .bind(synth.year)
    .bind(&synth.img)
    .execute(&mut *conn)
    .await?;

    let reread = find_synth(conn, &synth.name, &synth.manufacturer).await?;
    Resolved::after_insert(inserted.rows_affected(), reread, "synth")
}
