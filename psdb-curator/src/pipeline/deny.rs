//! Denial of a pending submission

use crate::db::file_journal::{self, FileAction};
use crate::db::pending;
use crate::models::{DocumentFiles, FileRef};
use crate::storage::{run_operations, FileStore, FinalizeReport};
use psdb_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenialReport {
    pub discarded: Vec<FileRef>,
    pub files: FinalizeReport,
}

/// Remove a pending submission and discard its pending files
///
/// Files held by filled entities live in approved storage and belong to
/// canonical entries; they are left alone.
pub async fn deny(db: &SqlitePool, files: &FileStore, id: Uuid) -> Result<DenialReport> {
    let submission = pending::dequeue(db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Pending submission {}", id)))?;

    let discard = DocumentFiles::of(&submission.document).pending;

    let mut tx = db.begin().await?;
    let mut operations = Vec::with_capacity(discard.len());
    for file in &discard {
        operations.push(file_journal::record(&mut tx, file, FileAction::Discard).await?);
    }
    if !pending::remove(&mut tx, id).await? {
        return Err(Error::NotFound(format!("Pending submission {}", id)));
    }
    tx.commit().await?;

    info!(pending_id = %id, files = discard.len(), "Denied submission");

    let report = run_operations(db, files, &operations).await;
    Ok(DenialReport {
        discarded: discard.into_iter().collect(),
        files: report,
    })
}
