//! Background sweep of file storage
//!
//! Replays journaled file operations left behind by a crash or an I/O error,
//! then deletes pending files that no pending submission or journal entry
//! references once they are older than the grace period. The grace period
//! covers uploads whose submission is still being processed.

use super::file_store::FileStore;
use super::finalize::{run_operations, FinalizeReport};
use crate::db::{file_journal, pending};
use crate::models::{DocumentFiles, FileKind, FileRef};
use psdb_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub journal: FinalizeReport,
    pub orphans_removed: usize,
}

#[derive(Debug, Clone)]
pub struct Sweeper {
    db: SqlitePool,
    files: FileStore,
    orphan_grace: Duration,
}

impl Sweeper {
    pub fn new(db: SqlitePool, files: FileStore, orphan_grace: Duration) -> Self {
        Self {
            db,
            files,
            orphan_grace,
        }
    }

    pub async fn sweep_once(&self) -> Result<SweepReport> {
        let operations = file_journal::outstanding(&self.db).await?;
        let journal = run_operations(&self.db, &self.files, &operations).await;

        // Read submissions before the journal: an approval moves its files
        // from one to the other in a single transaction
        let mut referenced: HashSet<FileRef> = HashSet::new();
        for submission in pending::list(&self.db).await? {
            referenced.extend(DocumentFiles::of(&submission.document).pending);
        }
        for op in file_journal::outstanding(&self.db).await? {
            referenced.insert(op.file);
        }

        let now = SystemTime::now();
        let mut orphans_removed = 0;
        for kind in FileKind::ALL {
            for candidate in self.files.list_pending(kind).await? {
                if referenced.contains(&candidate.file) {
                    continue;
                }
                let age = now.duration_since(candidate.modified).unwrap_or_default();
                if age < self.orphan_grace {
                    continue;
                }
                match self.files.discard_pending(&candidate.file).await {
                    Ok(true) => {
                        info!(file = %candidate.file, age_secs = age.as_secs(), "Removed orphaned pending file");
                        orphans_removed += 1;
                    }
                    Ok(false) => {}
                    Err(e) => warn!(file = %candidate.file, error = %e, "Failed to remove orphaned pending file"),
                }
            }
        }

        let report = SweepReport {
            journal,
            orphans_removed,
        };
        if report != SweepReport::default() {
            info!(
                completed = report.journal.completed,
                deferred = report.journal.deferred,
                orphans_removed = report.orphans_removed,
                "Sweep finished"
            );
        }
        Ok(report)
    }

    /// Run a sweep now and then every `interval`
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once().await {
                    error!(error = %e, "Sweep failed");
                }
            }
        })
    }
}
