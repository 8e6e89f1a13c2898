//! Preset lookups and inserts
//!
//! Presets belong to a synth: the natural key is (synth, name, pack, author).

use super::Resolved;
use crate::models::PresetEntry;
use psdb_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Pack name used when a preset is submitted without one
pub const DEFAULT_PACK_NAME: &str = "Factory";

/// Canonical preset row
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub preset_id: i64,
    pub synth_id: i64,
    pub name: String,
    pub pack_name: String,
    pub author: String,
}

fn from_row(row: &SqliteRow) -> Preset {
    Preset {
        preset_id: row.get("preset_id"),
        synth_id: row.get("synth_id"),
        name: row.get("preset_name"),
        pack_name: row.get("pack_name"),
        author: row.get("author"),
    }
}

/// Fill in the pack name and author a preset defaults to
///
/// An empty pack becomes "Factory"; an empty author becomes the synth's
/// manufacturer.
pub fn apply_preset_defaults(preset: &mut PresetEntry, manufacturer: &str) {
    if preset.pack_name.is_empty() {
        preset.pack_name = DEFAULT_PACK_NAME.to_string();
    }
    if preset.author.is_empty() {
        preset.author = manufacturer.to_string();
    }
}

pub async fn find_preset(
    conn: &mut SqliteConnection,
    synth_id: i64,
    name: &str,
    pack_name: &str,
    author: &str,
) -> Result<Option<Preset>> {
    let row = sqlx::query(
        r#"
        SELECT preset_id, synth_id, preset_name, pack_name, author
        FROM presets
        WHERE synth_id = ? AND preset_name = ? AND pack_name = ? AND author = ?
        "#,
    )
    .bind(synth_id)
    .bind(name)
    .bind(pack_name)
    .bind(author)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(from_row))
}

/// Find or create `preset` under `synth_id`
///
/// The preset's pack name and author are used as given; callers apply
/// [`apply_preset_defaults`] first.
pub async fn find_or_create_preset(
    conn: &mut SqliteConnection,
    synth_id: i64,
    preset: &PresetEntry,
) -> Result<Resolved<Preset>> {
    let (name, pack, author) = (&preset.name, &preset.pack_name, &preset.author);

    if let Some(existing) = find_preset(conn, synth_id, name, pack, author).await? {
        return Ok(Resolved::existing(existing));
    }

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO presets (synth_id, preset_name, pack_name, author) VALUES (?, ?, ?, ?)",
    )
    .bind(synth_id)
    .bind(name)
    .bind(pack)
    .bind(author)
    .execute(&mut *conn)
    .await?;

    let reread = find_preset(conn, synth_id, name, pack, author).await?;
    Resolved::after_insert(inserted.rows_affected(), reread, "preset")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_empty_fields_only() {
        let mut preset = PresetEntry {
            name: "Brass 1".to_string(),
            ..Default::default()
        };
        apply_preset_defaults(&mut preset, "Roland");
        assert_eq!(preset.pack_name, "Factory");
        assert_eq!(preset.author, "Roland");

        let mut preset = PresetEntry {
            name: "Glass".to_string(),
            pack_name: "Vintage".to_string(),
            author: "Jane".to_string(),
            ..Default::default()
        };
        apply_preset_defaults(&mut preset, "Roland");
        assert_eq!(preset.pack_name, "Vintage");
        assert_eq!(preset.author, "Jane");
    }
}
