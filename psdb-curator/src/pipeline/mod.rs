//! Submission pipeline
//!
//! ```text
//! submit:  form -> attach -> sanitize -> validate -> reconcile -> pending store
//! approve: pending + admin edits -> attach -> sanitize -> flags -> commit
//! deny:    pending -> discard pending files
//! upload:  form -> attach -> sanitize -> validate -> reconcile -> commit
//! ```
//!
//! Uploads of a request that fails are discarded before the error is
//! returned.

pub mod approve;
pub mod attach;
pub mod commit;
pub mod deny;
pub mod form;
pub mod reconcile;
pub mod sanitize;

pub use attach::{attach_files, Attached};
pub use commit::{CommitReport, CommitSource, CommittedIds, Committer};
pub use deny::DenialReport;
pub use reconcile::Reconciler;
pub use sanitize::sanitize;

use crate::db::pending;
use crate::models::{SubmissionDocument, SubmissionForm, UploadedFile};
use crate::storage::FileStore;
use psdb_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SubmissionPipeline {
    db: SqlitePool,
    files: FileStore,
}

impl SubmissionPipeline {
    pub fn new(db: SqlitePool, files: FileStore) -> Self {
        Self { db, files }
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    /// Queue a user submission for review
    pub async fn submit(&self, form: &SubmissionForm, user_id: Option<i64>) -> Result<Uuid> {
        let result = self.submit_inner(form, user_id).await;
        self.cleanup_on_error(&result, &form.files).await;
        result
    }

    async fn submit_inner(&self, form: &SubmissionForm, user_id: Option<i64>) -> Result<Uuid> {
        let mut doc = self.prepare(&SubmissionDocument::default(), form).await?;
        doc.user_id = user_id;
        doc.validate()?;

        let doc = Reconciler::new(&self.db, &self.files).reconcile(&doc).await?;
        pending::enqueue(&self.db, &doc, user_id).await
    }

    /// Approve a pending submission with the admin's edits
    pub async fn approve(&self, id: Uuid, edits: &SubmissionForm) -> Result<CommitReport> {
        let result = self.approve_inner(id, edits).await;
        self.cleanup_on_error(&result, &edits.files).await;
        result
    }

    async fn approve_inner(&self, id: Uuid, edits: &SubmissionForm) -> Result<CommitReport> {
        let submission = pending::dequeue(&self.db, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Pending submission {}", id)))?;

        let mut merged = self.prepare(&submission.document, edits).await?;
        approve::carry_forward_flags(&submission.document, &mut merged);

        let user_id = submission.user_id.or(submission.document.user_id);
        let source = CommitSource::Pending {
            id,
            original: &submission.document,
        };
        Committer::new(&self.db, &self.files)
            .commit(&merged, user_id, source)
            .await
    }

    /// Deny a pending submission
    pub async fn deny(&self, id: Uuid) -> Result<DenialReport> {
        deny::deny(&self.db, &self.files, id).await
    }

    /// Commit a trusted upload directly, skipping review
    pub async fn direct_upload(
        &self,
        form: &SubmissionForm,
        user_id: Option<i64>,
    ) -> Result<CommitReport> {
        let result = self.direct_upload_inner(form, user_id).await;
        self.cleanup_on_error(&result, &form.files).await;
        result
    }

    async fn direct_upload_inner(
        &self,
        form: &SubmissionForm,
        user_id: Option<i64>,
    ) -> Result<CommitReport> {
        let mut doc = self.prepare(&SubmissionDocument::default(), form).await?;
        doc.user_id = user_id;
        doc.validate()?;

        let doc = Reconciler::new(&self.db, &self.files).reconcile(&doc).await?;
        Committer::new(&self.db, &self.files)
            .commit(&doc, user_id, CommitSource::Direct)
            .await
    }

    /// Overlay form fields and uploads on `base`, then sanitize
    ///
    /// Uploads that could not be attached are discarded right away.
    async fn prepare(
        &self,
        base: &SubmissionDocument,
        form: &SubmissionForm,
    ) -> Result<SubmissionDocument> {
        let mut doc = base.clone();
        form::apply_text_fields(&mut doc, &form.fields)?;

        let attached = attach_files(&doc, &form.files);
        self.discard_uploads(&attached.unattached).await;

        Ok(sanitize(&attached.document))
    }

    async fn cleanup_on_error<T>(&self, result: &Result<T>, uploads: &[UploadedFile]) {
        if result.is_err() {
            self.discard_uploads(uploads).await;
        }
    }

    /// Discard uploads a request will not use
    pub async fn discard_uploads(&self, uploads: &[UploadedFile]) {
        for upload in uploads {
            if let Err(e) = self.files.discard_pending(&upload.file_ref()).await {
                warn!(file = %upload.stored_name, error = %e, "Failed to discard upload");
            }
        }
    }
}
