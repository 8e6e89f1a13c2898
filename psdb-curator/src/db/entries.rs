//! Direct access to canonical entries for admins
//!
//! Only the canonical entity tables are reachable, and only through their
//! whitelisted columns; table and column names are never taken from input.

use psdb_common::{Error, Result};
use serde_json::{json, Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, ValueRef};
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTable {
    Songs,
    Albums,
    Artists,
    Synths,
    Presets,
}

/// Column value types accepted by updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Text,
    NullableText,
    NullableInteger,
    Integer,
}

impl EntryTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            EntryTable::Songs => "songs",
            EntryTable::Albums => "albums",
            EntryTable::Artists => "artists",
            EntryTable::Synths => "synths",
            EntryTable::Presets => "presets",
        }
    }

    pub fn id_column(&self) -> &'static str {
        match self {
            EntryTable::Songs => "song_id",
            EntryTable::Albums => "album_id",
            EntryTable::Artists => "artist_id",
            EntryTable::Synths => "synth_id",
            EntryTable::Presets => "preset_id",
        }
    }

    /// Editable columns and their types
    fn columns(&self) -> &'static [(&'static str, ColumnType)] {
        use ColumnType::*;
        match self {
            EntryTable::Songs => &[
                ("song_title", Text),
                ("song_genre", Text),
                ("release_year", NullableInteger),
                ("song_url", Text),
                ("song_img", NullableText),
            ],
            EntryTable::Albums => &[
                ("album_title", Text),
                ("album_genre", Text),
                ("release_year", NullableInteger),
                ("album_img", NullableText),
            ],
            EntryTable::Artists => &[
                ("artist_name", Text),
                ("country", Text),
                ("artist_img", NullableText),
            ],
            EntryTable::Synths => &[
                ("synth_name", Text),
                ("manufacturer", Text),
                ("synth_type", Text),
                ("release_year", NullableInteger),
                ("synth_img", NullableText),
            ],
            EntryTable::Presets => &[
                ("synth_id", Integer),
                ("preset_name", Text),
                ("pack_name", Text),
                ("author", Text),
            ],
        }
    }

    fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns()
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, ty)| *ty)
    }

    /// Relationship rows referencing this entry, deleted along with it
    fn dependents(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            EntryTable::Songs => &[
                ("user_submissions", "song_preset_id IN (SELECT song_preset_id FROM song_presets WHERE song_id = ?)"),
                ("song_presets", "song_id = ?"),
                ("song_artists", "song_id = ?"),
                ("album_songs", "song_id = ?"),
            ],
            EntryTable::Albums => &[("album_songs", "album_id = ?")],
            EntryTable::Artists => &[("song_artists", "artist_id = ?")],
            EntryTable::Synths => &[
                ("user_submissions", "song_preset_id IN (SELECT sp.song_preset_id FROM song_presets sp JOIN presets p ON p.preset_id = sp.preset_id WHERE p.synth_id = ?)"),
                ("song_presets", "preset_id IN (SELECT preset_id FROM presets WHERE synth_id = ?)"),
                ("preset_synths", "synth_id = ?"),
                ("preset_synths", "preset_id IN (SELECT preset_id FROM presets WHERE synth_id = ?)"),
                ("presets", "synth_id = ?"),
            ],
            EntryTable::Presets => &[
                ("user_submissions", "song_preset_id IN (SELECT song_preset_id FROM song_presets WHERE preset_id = ?)"),
                ("song_presets", "preset_id = ?"),
                ("preset_synths", "preset_id = ?"),
            ],
        }
    }
}

impl fmt::Display for EntryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for EntryTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "songs" => Ok(EntryTable::Songs),
            "albums" => Ok(EntryTable::Albums),
            "artists" => Ok(EntryTable::Artists),
            "synths" => Ok(EntryTable::Synths),
            "presets" => Ok(EntryTable::Presets),
            other => Err(Error::InvalidInput(format!("Invalid table name: {}", other))),
        }
    }
}

/// Convert a row to a JSON object keyed by column name
fn row_to_json(row: &SqliteRow) -> Map<String, Value> {
    let mut object = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value = match row.try_get_raw(i) {
            Ok(raw) if raw.is_null() => Value::Null,
            Ok(_) => row
                .try_get::<String, _>(i)
                .map(Value::String)
                .or_else(|_| row.try_get::<i64, _>(i).map(|v| json!(v)))
                .or_else(|_| row.try_get::<f64, _>(i).map(|v| json!(v)))
                .unwrap_or(Value::Null),
            Err(_) => Value::Null,
        };
        object.insert(column.name().to_string(), value);
    }
    object
}

pub async fn get_entry(
    pool: &SqlitePool,
    table: EntryTable,
    id: i64,
) -> Result<Option<Map<String, Value>>> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} = ?",
        table.table_name(),
        table.id_column()
    );
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(row_to_json))
}

/// Update whitelisted columns of one entry
///
/// Returns false when no entry has `id`. Unknown columns and values of the
/// wrong type are rejected before anything is written.
pub async fn update_entry(
    pool: &SqlitePool,
    table: EntryTable,
    id: i64,
    changes: &Map<String, Value>,
) -> Result<bool> {
    if changes.is_empty() {
        return Err(Error::InvalidInput("No columns to update".to_string()));
    }

    let mut assignments = Vec::with_capacity(changes.len());
    let mut values = Vec::with_capacity(changes.len());
    for (column, value) in changes {
        let ty = table
            .column_type(column)
            .ok_or_else(|| Error::InvalidInput(format!("Invalid column: {}", column)))?;
        values.push(bind_value(column, ty, value)?);
        assignments.push(format!("{} = ?", column));
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table.table_name(),
        assignments.join(", "),
        table.id_column()
    );

    let mut query = sqlx::query(&sql);
    for value in values {
        query = match value {
            BindValue::Null => query.bind(None::<String>),
            BindValue::Integer(n) => query.bind(n),
            BindValue::Text(s) => query.bind(s),
        };
    }

    let result = query
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| constraint_error(table, e))?;
    let updated = result.rows_affected() > 0;
    if updated {
        info!(table = %table, id, columns = changes.len(), "Updated entry");
    }
    Ok(updated)
}

/// Key and reference conflicts are the caller's fault, not the database's
fn constraint_error(table: EntryTable, err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
        {
            Error::InvalidInput(format!(
                "Update conflicts with existing {}: {}",
                table.table_name(),
                db_err.message()
            ))
        }
        _ => Error::from(err),
    }
}

enum BindValue {
    Null,
    Integer(i64),
    Text(String),
}

fn bind_value(column: &str, ty: ColumnType, value: &Value) -> Result<BindValue> {
    match (ty, value) {
        (ColumnType::Text | ColumnType::NullableText, Value::String(s)) => {
            Ok(BindValue::Text(s.clone()))
        }
        (ColumnType::NullableText | ColumnType::NullableInteger, Value::Null) => {
            Ok(BindValue::Null)
        }
        (ColumnType::Integer | ColumnType::NullableInteger, Value::Number(n)) if n.is_i64() => {
            Ok(BindValue::Integer(n.as_i64().unwrap_or_default()))
        }
        _ => Err(Error::InvalidInput(format!(
            "Invalid value for {}: {}",
            column, value
        ))),
    }
}

/// Delete one entry together with the relationship rows referencing it
///
/// Returns false when no entry has `id`; nothing is deleted in that case.
pub async fn delete_entry(pool: &SqlitePool, table: EntryTable, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;

    for (dependent, condition) in table.dependents() {
        let sql = format!("DELETE FROM {} WHERE {}", dependent, condition);
        sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
    }

    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        table.table_name(),
        table.id_column()
    );
    let deleted = sqlx::query(&sql).bind(id).execute(&mut *tx).await?.rows_affected() > 0;

    if deleted {
        tx.commit().await?;
        info!(table = %table, id, "Deleted entry");
    } else {
        tx.rollback().await?;
    }
    Ok(deleted)
}
