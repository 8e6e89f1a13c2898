//! Data models for the submission pipeline

pub mod document;
pub mod field_path;
pub mod file_ref;
pub mod upload;

pub use document::{
    AlbumEntry, ArtistEntry, PresetEntry, SongEntry, SubmissionDocument, SynthEntry,
    DOCUMENT_VERSION, MAIN_ROLE,
};
pub use field_path::{FieldPath, FieldPathError, Segment};
pub use file_ref::{DocumentFiles, FileKind, FileRef};
pub use upload::{SubmissionForm, UploadedFile};
