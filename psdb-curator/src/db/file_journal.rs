//! File operation journal
//!
//! Promotions and discards are recorded in the same transaction as the
//! database change that requires them and removed once carried out. Entries
//! left behind by a crash or an I/O failure are replayed by the sweep.

use crate::models::{FileKind, FileRef};
use chrono::Utc;
use psdb_common::{Error, Result};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAction {
    /// Move from pending to approved storage
    Promote,
    /// Delete from pending storage
    Discard,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Promote => "promote",
            FileAction::Discard => "discard",
        }
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "promote" => Ok(FileAction::Promote),
            "discard" => Ok(FileAction::Discard),
            other => Err(format!("unknown file action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOperation {
    pub op_id: i64,
    pub file: FileRef,
    pub action: FileAction,
    pub attempts: i64,
}

/// Record a file operation on the caller's connection (normally a transaction)
pub async fn record(
    conn: &mut SqliteConnection,
    file: &FileRef,
    action: FileAction,
) -> Result<FileOperation> {
    let result = sqlx::query(
        "INSERT INTO file_operations (file_kind, file_name, action, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(file.kind.as_str())
    .bind(&file.name)
    .bind(action.as_str())
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(FileOperation {
        op_id: result.last_insert_rowid(),
        file: file.clone(),
        action,
        attempts: 0,
    })
}

/// Operations not yet carried out, in recording order
pub async fn outstanding(pool: &SqlitePool) -> Result<Vec<FileOperation>> {
    let rows = sqlx::query(
        "SELECT op_id, file_kind, file_name, action, attempts FROM file_operations ORDER BY op_id",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let kind: String = row.get("file_kind");
            let action: String = row.get("action");
            Ok(FileOperation {
                op_id: row.get("op_id"),
                file: FileRef::new(
                    FileKind::from_str(&kind).map_err(Error::Internal)?,
                    row.get::<String, _>("file_name"),
                ),
                action: FileAction::from_str(&action).map_err(Error::Internal)?,
                attempts: row.get("attempts"),
            })
        })
        .collect()
}

/// Remove a carried-out operation
pub async fn complete(pool: &SqlitePool, op_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM file_operations WHERE op_id = ?")
        .bind(op_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Count a failed attempt; the entry stays for the next sweep
pub async fn record_failure(pool: &SqlitePool, op_id: i64) -> Result<()> {
    sqlx::query("UPDATE file_operations SET attempts = attempts + 1 WHERE op_id = ?")
        .bind(op_id)
        .execute(pool)
        .await?;
    Ok(())
}
