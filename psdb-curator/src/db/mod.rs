//! Database access for the curator
//!
//! Canonical lookups and inserts take a `&mut SqliteConnection` so the same
//! code runs on a pooled connection (reconciliation) and inside an approval
//! transaction (`&mut *tx`).

pub mod albums;
pub mod artists;
pub mod entries;
pub mod file_journal;
pub mod links;
pub mod pending;
pub mod presets;
pub mod retry;
pub mod songs;
pub mod synths;

use psdb_common::{Error, Result};
use tracing::debug;

/// Outcome of a find-or-create on a natural key
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub row: T,
    /// Row was inserted by this call
    pub created: bool,
}

impl<T> Resolved<T> {
    pub fn existing(row: T) -> Self {
        Self {
            row,
            created: false,
        }
    }

    /// Classify the re-read that follows an `INSERT OR IGNORE`
    ///
    /// No affected rows means a concurrent writer claimed the natural key
    /// between lookup and insert; the re-read row is theirs.
    pub(crate) fn after_insert(rows_affected: u64, reread: Option<T>, entity: &str) -> Result<Self> {
        let row = reread.ok_or_else(|| {
            Error::Internal(format!("{} not found after insert", entity))
        })?;

        if rows_affected == 0 {
            debug!(entity, "Natural key claimed concurrently, using existing row");
            Ok(Self::existing(row))
        } else {
            Ok(Self { row, created: true })
        }
    }
}
