//! Multipart upload intake
//!
//! Text parts become form fields. File parts are size-checked, sniffed by
//! content and written to pending storage under a generated name. If the
//! request fails partway, files already written are removed again.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use tracing::{debug, warn};

use crate::models::{FileKind, SubmissionForm, UploadedFile};
use crate::storage::FileStore;
use crate::{ApiError, ApiResult};

/// Accepted upload types: sniffed MIME type, kind, stored extension
const ACCEPTED_TYPES: &[(&str, FileKind, &str)] = &[
    ("image/png", FileKind::Image, "png"),
    ("image/jpeg", FileKind::Image, "jpg"),
    ("image/webp", FileKind::Image, "webp"),
    ("audio/mpeg", FileKind::Audio, "mp3"),
];

/// Read a multipart body into a form, storing its files as pending uploads
pub async fn read_form(
    files: &FileStore,
    max_upload_bytes: u64,
    mut multipart: Multipart,
) -> ApiResult<SubmissionForm> {
    let mut form = SubmissionForm::default();

    if let Err(e) = read_parts(files, max_upload_bytes, &mut multipart, &mut form).await {
        discard_stored(files, &form.files).await;
        return Err(e);
    }

    debug!(
        fields = form.fields.len(),
        files = form.files.len(),
        "Read multipart submission"
    );
    Ok(form)
}

async fn read_parts(
    files: &FileStore,
    max_upload_bytes: u64,
    multipart: &mut Multipart,
    form: &mut SubmissionForm,
) -> ApiResult<()> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            warn!("Skipping unnamed multipart part");
            continue;
        };

        if field.file_name().is_none() {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.push((name, value));
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        let declared_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        // Browsers send an empty part for file inputs left blank
        if bytes.is_empty() {
            continue;
        }

        if bytes.len() as u64 > max_upload_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File for '{}' exceeds {} bytes",
                name, max_upload_bytes
            )));
        }

        let (kind, extension) = classify(declared_type.as_deref(), &bytes)?;
        let stored_name = files
            .store_upload(kind, original_name.as_deref(), extension, &bytes)
            .await?;

        form.files.push(UploadedFile {
            field_name: name,
            stored_name,
            kind,
        });
    }

    Ok(())
}

/// Determine the kind of an upload from its content
///
/// A declared content type other than `application/octet-stream` must agree
/// with the sniffed one.
fn classify(declared: Option<&str>, bytes: &[u8]) -> ApiResult<(FileKind, &'static str)> {
    let sniffed = infer::get(bytes)
        .map(|t| t.mime_type())
        .ok_or_else(|| ApiError::BadRequest("Unrecognized file type".to_string()))?;

    let &(_, kind, extension) = ACCEPTED_TYPES
        .iter()
        .find(|(mime, _, _)| *mime == sniffed)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported file type: {}", sniffed)))?;

    if let Some(declared) = declared.map(normalize_mime) {
        if declared != "application/octet-stream" && declared != sniffed {
            return Err(ApiError::BadRequest(format!(
                "Declared type {} does not match file content ({})",
                declared, sniffed
            )));
        }
    }

    Ok((kind, extension))
}

fn normalize_mime(mime: &str) -> &str {
    match mime {
        "image/jpg" => "image/jpeg",
        "audio/mp3" => "audio/mpeg",
        other => other,
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
    }
}

async fn discard_stored(files: &FileStore, uploads: &[UploadedFile]) {
    for upload in uploads {
        if let Err(e) = files.discard_pending(&upload.file_ref()).await {
            warn!(file = %upload.stored_name, error = %e, "Failed to discard upload");
        }
    }
}
