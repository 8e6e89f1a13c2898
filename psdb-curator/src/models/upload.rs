//! Parsed multipart submissions

use super::file_ref::{FileKind, FileRef};

/// A file written to pending storage by upload intake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under, e.g. `synths[0][presets][1][audio]`
    pub field_name: String,
    /// Generated name under pending storage
    pub stored_name: String,
    pub kind: FileKind,
}

impl UploadedFile {
    pub fn file_ref(&self) -> FileRef {
        FileRef::new(self.kind, self.stored_name.clone())
    }
}

/// Text fields and stored files of one multipart request
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

impl SubmissionForm {
    /// Remove and return the first text field called `name`
    pub fn take_field(&mut self, name: &str) -> Option<String> {
        let index = self.fields.iter().position(|(key, _)| key == name)?;
        Some(self.fields.remove(index).1)
    }
}
