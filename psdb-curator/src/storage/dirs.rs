//! Upload directory layout
//!
//! ```text
//! {uploads}/images/pending    {uploads}/images/approved
//! {uploads}/audio/pending     {uploads}/audio/approved
//! ```

use crate::models::FileKind;
use psdb_common::Result;
use std::path::{Path, PathBuf};

const PENDING_DIR: &str = "pending";
const APPROVED_DIR: &str = "approved";

/// Explicit upload directory configuration, passed to every component that
/// touches stored files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDirs {
    root: PathBuf,
}

impl UploadDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pending(&self, kind: FileKind) -> PathBuf {
        self.root.join(kind.dir_name()).join(PENDING_DIR)
    }

    pub fn approved(&self, kind: FileKind) -> PathBuf {
        self.root.join(kind.dir_name()).join(APPROVED_DIR)
    }

    /// Create all four storage directories
    pub async fn ensure_exist(&self) -> Result<()> {
        for kind in FileKind::ALL {
            tokio::fs::create_dir_all(self.pending(kind)).await?;
            tokio::fs::create_dir_all(self.approved(kind)).await?;
        }
        Ok(())
    }
}
