//! File reference attacher
//!
//! Writes the stored name of every uploaded file into the document position
//! named by its form field. The caller's document is never modified.

use super::form::{resolve, Slot};
use crate::models::{FieldPath, SubmissionDocument, UploadedFile};
use tracing::{debug, warn};

/// Result of attaching uploads to a document
#[derive(Debug, Clone)]
pub struct Attached {
    pub document: SubmissionDocument,
    /// Uploads that could not be placed (bad field name or wrong file kind)
    pub unattached: Vec<UploadedFile>,
}

/// Attach uploaded files to a copy of `doc`
///
/// With no uploads the copy equals the input. Uploads whose field name is
/// malformed, does not address a file position, or addresses a position of
/// the other file kind are skipped with a warning and reported back so their
/// stored files can be discarded.
pub fn attach_files(doc: &SubmissionDocument, files: &[UploadedFile]) -> Attached {
    let mut document = doc.clone();
    let mut unattached = Vec::new();

    for file in files {
        let slot = match FieldPath::parse(&file.field_name) {
            Ok(path) => resolve(&path),
            Err(e) => {
                warn!(field = %file.field_name, error = %e, "Skipping upload with malformed field name");
                unattached.push(file.clone());
                continue;
            }
        };

        match slot {
            Some(Slot::File(slot)) if slot.kind() == file.kind => {
                debug!(field = %file.field_name, file = %file.stored_name, "Attached upload");
                slot.assign(&mut document, &file.stored_name);
            }
            Some(Slot::File(slot)) => {
                warn!(
                    field = %file.field_name,
                    expected = %slot.kind(),
                    received = %file.kind,
                    "Skipping upload of the wrong kind"
                );
                unattached.push(file.clone());
            }
            _ => {
                warn!(field = %file.field_name, "Skipping upload for a non-file field");
                unattached.push(file.clone());
            }
        }
    }

    Attached {
        document,
        unattached,
    }
}
