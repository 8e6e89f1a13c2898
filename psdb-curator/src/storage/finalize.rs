//! Carrying out journaled file operations

use super::file_store::{FileStore, PromoteOutcome};
use crate::db::file_journal::{self, FileAction, FileOperation};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeReport {
    /// Operations carried out and removed from the journal
    pub completed: usize,
    /// Operations that failed and stay journaled for the sweep
    pub deferred: usize,
}

impl FinalizeReport {
    pub fn merge(&mut self, other: FinalizeReport) {
        self.completed += other.completed;
        self.deferred += other.deferred;
    }
}

/// Carry out file operations and remove each completed one from the journal
///
/// Failures are logged and counted, never returned: the database state is
/// already committed and the sweep retries whatever is left.
pub async fn run_operations(
    db: &SqlitePool,
    files: &FileStore,
    operations: &[FileOperation],
) -> FinalizeReport {
    let mut report = FinalizeReport::default();

    for op in operations {
        let outcome = match op.action {
            FileAction::Promote => files.promote(&op.file).await.map(|outcome| {
                if outcome == PromoteOutcome::AlreadyApproved {
                    info!(file = %op.file, "File was already promoted");
                }
            }),
            FileAction::Discard => files.discard_pending(&op.file).await.map(|_| ()),
        };

        if let Err(e) = outcome {
            warn!(
                op_id = op.op_id,
                action = %op.action,
                file = %op.file,
                attempts = op.attempts + 1,
                error = %e,
                "File operation failed, leaving it for the sweep"
            );
            if let Err(e) = file_journal::record_failure(db, op.op_id).await {
                warn!(op_id = op.op_id, error = %e, "Failed to count file operation attempt");
            }
            report.deferred += 1;
            continue;
        }

        match file_journal::complete(db, op.op_id).await {
            Ok(()) => report.completed += 1,
            Err(e) => {
                // The operation is idempotent, so a replay is harmless
                warn!(op_id = op.op_id, error = %e, "Failed to clear completed file operation");
                report.deferred += 1;
            }
        }
    }

    report
}
