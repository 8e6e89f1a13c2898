//! Pending submission store
//!
//! Submissions waiting for review are kept as one row each holding the
//! serialized document. Rows are never updated: approval and denial remove
//! them, and a resubmission is a new row.

use crate::models::SubmissionDocument;
use chrono::{DateTime, SecondsFormat, Utc};
use psdb_common::{Error, Result};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmission {
    pub id: Uuid,
    pub document: SubmissionDocument,
    pub submitted_at: DateTime<Utc>,
    pub user_id: Option<i64>,
}

fn from_row(row: &SqliteRow) -> Result<PendingSubmission> {
    let id: String = row.get("id");
    let data: String = row.get("data");
    let submitted_at: String = row.get("submitted_at");

    Ok(PendingSubmission {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Invalid pending id {}: {}", id, e)))?,
        document: serde_json::from_str(&data)?,
        submitted_at: DateTime::parse_from_rfc3339(&submitted_at)
            .map_err(|e| Error::Internal(format!("Invalid submitted_at for {}: {}", id, e)))?
            .with_timezone(&Utc),
        user_id: row.get("user_id"),
    })
}

/// Store a document for review, returning its generated id
pub async fn enqueue(
    pool: &SqlitePool,
    document: &SubmissionDocument,
    user_id: Option<i64>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let data = serde_json::to_string(document)?;
    // Fixed-width timestamps keep text ordering chronological
    let submitted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    sqlx::query(
        "INSERT INTO pending_submissions (id, data, submitted_at, user_id) VALUES (?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&data)
    .bind(&submitted_at)
    .bind(user_id)
    .execute(pool)
    .await?;

    info!(pending_id = %id, user_id = ?user_id, "Submission queued for review");
    Ok(id)
}

/// Read one pending submission
pub async fn dequeue(pool: &SqlitePool, id: Uuid) -> Result<Option<PendingSubmission>> {
    let row = sqlx::query(
        "SELECT id, data, submitted_at, user_id FROM pending_submissions WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Delete a pending submission, returning false if it was already gone
pub async fn remove(conn: &mut SqliteConnection, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM pending_submissions WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Every pending submission, oldest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<PendingSubmission>> {
    let rows = sqlx::query(
        "SELECT id, data, submitted_at, user_id FROM pending_submissions ORDER BY submitted_at, id",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}
