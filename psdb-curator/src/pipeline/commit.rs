//! Transactional commit of a submission into canonical tables
//!
//! Canonical rows, relationship rows, the file journal entries and (for an
//! approval) the pending row deletion are written in one transaction. File
//! promotions and discards run after commit from the journal; the sweep
//! finishes any that fail.
//!
//! Canonical rows are never modified: an entity matching an existing row
//! links to it, and an upload made for it is discarded instead of promoted.

use crate::db::albums::{self, SINGLE_ALBUM_ID};
use crate::db::file_journal::{self, FileAction, FileOperation};
use crate::db::links::{self, SongPresetUsage};
use crate::db::retry::retry_on_lock;
use crate::db::{artists, pending, presets, songs, synths};
use crate::models::{DocumentFiles, FileRef, SubmissionDocument};
use crate::storage::{run_operations, FileStore, FinalizeReport};
use chrono::Utc;
use psdb_common::{Error, Result};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// How long a commit keeps retrying while other writers hold the database
const COMMIT_LOCK_WAIT: Duration = Duration::from_secs(15);

/// Where the committed document comes from
#[derive(Debug, Clone, Copy)]
pub enum CommitSource<'a> {
    /// Approval of a pending submission, removed by the same transaction
    Pending {
        id: Uuid,
        original: &'a SubmissionDocument,
    },
    /// Trusted direct upload that never went through review
    Direct,
}

/// Canonical ids touched by a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedIds {
    pub song_id: i64,
    /// 0 for singles
    pub album_id: i64,
    pub artist_ids: Vec<i64>,
    pub synth_ids: Vec<i64>,
    pub preset_ids: Vec<i64>,
    pub song_preset_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReport {
    pub ids: CommittedIds,
    pub promoted: Vec<FileRef>,
    pub discarded: Vec<FileRef>,
    pub files: FinalizeReport,
}

struct Staged {
    ids: CommittedIds,
    operations: Vec<FileOperation>,
    promoted: Vec<FileRef>,
    discarded: Vec<FileRef>,
}

pub struct Committer<'a> {
    db: &'a SqlitePool,
    files: &'a FileStore,
}

impl<'a> Committer<'a> {
    pub fn new(db: &'a SqlitePool, files: &'a FileStore) -> Self {
        Self { db, files }
    }

    pub async fn commit(
        &self,
        doc: &SubmissionDocument,
        user_id: Option<i64>,
        source: CommitSource<'_>,
    ) -> Result<CommitReport> {
        doc.validate()?;

        let staged = retry_on_lock("submission commit", COMMIT_LOCK_WAIT, || {
            self.try_commit(doc, user_id, source)
        })
        .await
        .map_err(|e| e.context("Error inserting submission data"))?;

        match source {
            CommitSource::Pending { id, .. } => info!(
                pending_id = %id,
                song_id = staged.ids.song_id,
                album_id = staged.ids.album_id,
                "Approved submission"
            ),
            CommitSource::Direct => info!(
                song_id = staged.ids.song_id,
                album_id = staged.ids.album_id,
                "Committed direct upload"
            ),
        }

        let files = run_operations(self.db, self.files, &staged.operations).await;

        Ok(CommitReport {
            ids: staged.ids,
            promoted: staged.promoted,
            discarded: staged.discarded,
            files,
        })
    }

    /// One attempt at the commit transaction, rolled back on any error
    async fn try_commit(
        &self,
        doc: &SubmissionDocument,
        user_id: Option<i64>,
        source: CommitSource<'_>,
    ) -> Result<Staged> {
        let mut tx = self.db.begin().await?;
        let staged = match stage(&mut tx, doc, user_id, source).await {
            Ok(staged) => staged,
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(error = %rollback_error, "Rollback failed");
                }
                return Err(e);
            }
        };
        tx.commit().await?;
        Ok(staged)
    }
}

async fn stage(
    conn: &mut SqliteConnection,
    doc: &SubmissionDocument,
    user_id: Option<i64>,
    source: CommitSource<'_>,
) -> Result<Staged> {
    let timestamp = Utc::now().to_rfc3339();
    let (ids, created_files) = insert_document(conn, doc, user_id, &timestamp).await?;

    // Files of rows created here move to approved storage; every other
    // pending file the submission ever referenced is discarded
    let mut final_files = DocumentFiles::of(doc);
    let mut candidates = BTreeSet::new();
    if let CommitSource::Pending { original, .. } = source {
        let original_files = DocumentFiles::of(original);
        // A canonical file stays canonical when an edit unfills its entity
        final_files
            .pending
            .retain(|file| !original_files.approved.contains(file));
        final_files.approved.extend(original_files.approved);
        candidates.extend(original_files.pending);
    }
    candidates.extend(final_files.pending.iter().cloned());

    let promote: BTreeSet<FileRef> = created_files
        .intersection(&final_files.pending)
        .cloned()
        .collect();
    let discard: BTreeSet<FileRef> = candidates
        .into_iter()
        .filter(|file| !promote.contains(file) && !final_files.approved.contains(file))
        .collect();

    let mut operations = Vec::with_capacity(promote.len() + discard.len());
    for file in &promote {
        operations.push(file_journal::record(conn, file, FileAction::Promote).await?);
    }
    for file in &discard {
        operations.push(file_journal::record(conn, file, FileAction::Discard).await?);
    }

    if let CommitSource::Pending { id, .. } = source {
        if !pending::remove(conn, id).await? {
            return Err(Error::NotFound(format!("Pending submission {}", id)));
        }
    }

    Ok(Staged {
        ids,
        operations,
        promoted: promote.into_iter().collect(),
        discarded: discard.into_iter().collect(),
    })
}

/// Insert or link every entity of the document
///
/// Returns the touched ids and the files referenced by rows created here.
async fn insert_document(
    conn: &mut SqliteConnection,
    doc: &SubmissionDocument,
    user_id: Option<i64>,
    timestamp: &str,
) -> Result<(CommittedIds, BTreeSet<FileRef>)> {
    let mut ids = CommittedIds::default();
    let mut created_files = BTreeSet::new();

    let song = songs::find_or_create_song(conn, &doc.song).await?;
    if song.created {
        created_files.extend(doc.song.img.clone().map(FileRef::image));
    }
    ids.song_id = song.row.song_id;

    ids.album_id = match doc.linked_album() {
        Some(album) => {
            let resolved = albums::find_or_create_album(conn, album).await?;
            if resolved.created {
                created_files.extend(album.img.clone().map(FileRef::image));
            }
            resolved.row.album_id
        }
        None => SINGLE_ALBUM_ID,
    };
    links::link_album_song(conn, ids.album_id, ids.song_id).await?;

    for artist in &doc.artists {
        let resolved = artists::find_or_create_artist(conn, artist).await?;
        if resolved.created {
            created_files.extend(artist.img.clone().map(FileRef::image));
        }
        links::link_song_artist(conn, ids.song_id, resolved.row.artist_id, &artist.role).await?;
        ids.artist_ids.push(resolved.row.artist_id);
    }

    for synth in &doc.synths {
        let resolved = synths::find_or_create_synth(conn, synth).await?;
        if resolved.created {
            created_files.extend(synth.img.clone().map(FileRef::image));
        }
        let synth_id = resolved.row.synth_id;
        ids.synth_ids.push(synth_id);

        for preset in &synth.presets {
            let mut preset = preset.clone();
            presets::apply_preset_defaults(&mut preset, &synth.manufacturer);

            let preset_id = presets::find_or_create_preset(conn, synth_id, &preset)
                .await?
                .row
                .preset_id;
            links::link_preset_synth(conn, preset_id, synth_id).await?;

            let usage = SongPresetUsage {
                song_id: ids.song_id,
                preset_id,
                usage_type: &preset.usage_type,
                verified: true,
                audio: preset.audio.as_deref(),
                timestamp,
            };
            let song_preset_id = links::insert_song_preset(conn, &usage).await?;
            // Preset audio belongs to this song's usage row
            created_files.extend(preset.audio.clone().map(FileRef::audio));

            if let Some(user_id) = user_id {
                links::insert_user_submission(conn, user_id, song_preset_id).await?;
            }

            ids.preset_ids.push(preset_id);
            ids.song_preset_ids.push(song_preset_id);
        }
    }

    Ok((ids, created_files))
}
