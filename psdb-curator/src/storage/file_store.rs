//! Pending and approved file storage
//!
//! Uploads land in pending storage under a generated unique name. Approval
//! promotes them (rename into approved storage); denial and reconciliation
//! discard them. Both operations are idempotent: a file that is already gone
//! (or already promoted) is not an error, so a journal replay can repeat them.

use super::dirs::UploadDirs;
use crate::models::{FileKind, FileRef};
use psdb_common::{Error, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Longest sanitized original name kept in a stored file name
const MAX_ORIGINAL_NAME_LEN: usize = 96;

const PARTIAL_SUFFIX: &str = ".part";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteOutcome {
    /// Moved from pending to approved storage
    Moved,
    /// Not in pending storage but already in approved storage
    AlreadyApproved,
    /// In neither area
    Missing,
}

/// A file found in pending storage
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub file: FileRef,
    pub modified: SystemTime,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dirs: UploadDirs,
}

impl FileStore {
    pub fn new(dirs: UploadDirs) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &UploadDirs {
        &self.dirs
    }

    pub fn pending_path(&self, file: &FileRef) -> Result<PathBuf> {
        Ok(self.dirs.pending(file.kind).join(checked_name(&file.name)?))
    }

    pub fn approved_path(&self, file: &FileRef) -> Result<PathBuf> {
        Ok(self.dirs.approved(file.kind).join(checked_name(&file.name)?))
    }

    /// Write an upload to pending storage, returning its stored name
    ///
    /// Stored names are `{uuid}-{sanitized original name}`; without a usable
    /// original name the fallback extension is used instead.
    pub async fn store_upload(
        &self,
        kind: FileKind,
        original_name: Option<&str>,
        fallback_extension: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let stored_name = storage_name(original_name, fallback_extension);
        let file = FileRef::new(kind, stored_name.clone());
        let final_path = self.pending_path(&file)?;
        let partial_path = final_path.with_file_name(format!("{}{}", stored_name, PARTIAL_SUFFIX));

        fs::create_dir_all(self.dirs.pending(kind)).await?;

        let write = async {
            let mut out = fs::File::create(&partial_path).await?;
            out.write_all(bytes).await?;
            out.flush().await?;
            fs::rename(&partial_path, &final_path).await
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&partial_path).await;
            return Err(e.into());
        }

        debug!(file = %file, bytes = bytes.len(), "Stored pending upload");
        Ok(stored_name)
    }

    /// Delete a file from pending storage
    ///
    /// Returns false when the file did not exist.
    pub async fn discard_pending(&self, file: &FileRef) -> Result<bool> {
        let path = self.pending_path(file)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(file = %file, "Discarded pending file");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Move a file from pending to approved storage
    pub async fn promote(&self, file: &FileRef) -> Result<PromoteOutcome> {
        let source = self.pending_path(file)?;
        let destination = self.approved_path(file)?;

        fs::create_dir_all(self.dirs.approved(file.kind)).await?;

        match fs::rename(&source, &destination).await {
            Ok(()) => {
                debug!(file = %file, "Promoted file to approved storage");
                Ok(PromoteOutcome::Moved)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if fs::try_exists(&destination).await? {
                    Ok(PromoteOutcome::AlreadyApproved)
                } else {
                    warn!(file = %file, "File to promote is in neither pending nor approved storage");
                    Ok(PromoteOutcome::Missing)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every file currently in pending storage for `kind`
    pub async fn list_pending(&self, kind: FileKind) -> Result<Vec<PendingFile>> {
        let dir = self.dirs.pending(kind);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            files.push(PendingFile {
                file: FileRef::new(kind, name),
                modified: metadata.modified()?,
            });
        }
        Ok(files)
    }
}

/// Reject names that would leave their storage directory
fn checked_name(name: &str) -> Result<&str> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(Error::InvalidInput(format!("Invalid stored file name: {:?}", name)));
    }
    Ok(name)
}

fn storage_name(original_name: Option<&str>, fallback_extension: &str) -> String {
    let id = Uuid::new_v4();
    let original = original_name
        .map(|name| sanitize_filename::sanitize(name.trim()))
        .map(|name| truncate_keeping_extension(&name, MAX_ORIGINAL_NAME_LEN))
        .filter(|name| !name.is_empty() && !name.starts_with('.'));

    match original {
        Some(name) => format!("{}-{}", id, name),
        None => format!("{}.{}", id, fallback_extension),
    }
}

fn truncate_keeping_extension(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }
    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= 12 => name.split_at(dot),
        _ => (name, ""),
    };
    let mut cut = max_len.saturating_sub(extension.len());
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &stem[..cut], extension)
}
