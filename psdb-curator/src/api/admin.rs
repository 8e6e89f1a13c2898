//! Admin review endpoints
//!
//! - GET  /admin/pending: list pending submissions, oldest first
//! - GET  /admin/pending/:id: one pending submission
//! - POST /admin/approve-submission: multipart edits plus `entryId`
//! - POST /admin/deny-submission: `{"submissionId": ...}`
//! - POST /admin/upload: trusted direct upload, no review

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::Submitter;
use super::intake;
use crate::db::pending::{self, PendingSubmission};
use crate::models::FileRef;
use crate::pipeline::CommitReport;
use crate::{ApiError, ApiResult, AppState};

/// Form field naming the pending submission being approved
const ENTRY_ID_FIELD: &str = "entryId";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub success: bool,
    pub message: String,
    pub result: CommitReport,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenyRequest {
    pub submission_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenyResponse {
    pub success: bool,
    pub message: String,
    pub discarded: Vec<FileRef>,
}

/// GET /admin/pending
pub async fn list_pending(State(state): State<AppState>) -> ApiResult<Json<Vec<PendingSubmission>>> {
    let submissions = pending::list(&state.db).await?;
    Ok(Json(submissions))
}

/// GET /admin/pending/:id
pub async fn get_pending(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PendingSubmission>> {
    let id = parse_submission_id(&id)?;
    let submission = pending::dequeue(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Pending submission {}", id)))?;
    Ok(Json(submission))
}

/// POST /admin/approve-submission
pub async fn approve_submission(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<CommitResponse>> {
    let mut form = intake::read_form(
        state.pipeline.files(),
        state.config.max_upload_bytes,
        multipart,
    )
    .await?;

    let id = match form
        .take_field(ENTRY_ID_FIELD)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {}", ENTRY_ID_FIELD)))
        .and_then(|raw| parse_submission_id(&raw))
    {
        Ok(id) => id,
        Err(e) => {
            state.pipeline.discard_uploads(&form.files).await;
            return Err(e);
        }
    };

    let report = state.pipeline.approve(id, &form).await?;
    Ok(Json(CommitResponse {
        success: true,
        message: "Submission approved".to_string(),
        result: report,
    }))
}

/// POST /admin/deny-submission
pub async fn deny_submission(
    State(state): State<AppState>,
    payload: Result<Json<DenyRequest>, JsonRejection>,
) -> ApiResult<Json<DenyResponse>> {
    let Json(request) = payload?;
    let id = parse_submission_id(&request.submission_id)?;
    let report = state.pipeline.deny(id).await?;

    Ok(Json(DenyResponse {
        success: true,
        message: "Submission denied".to_string(),
        discarded: report.discarded,
    }))
}

/// POST /admin/upload
pub async fn direct_upload(
    State(state): State<AppState>,
    Submitter(user_id): Submitter,
    multipart: Multipart,
) -> ApiResult<Json<CommitResponse>> {
    let form = intake::read_form(
        state.pipeline.files(),
        state.config.max_upload_bytes,
        multipart,
    )
    .await?;

    let report = state.pipeline.direct_upload(&form, user_id).await?;
    Ok(Json(CommitResponse {
        success: true,
        message: "Upload committed".to_string(),
        result: report,
    }))
}

fn parse_submission_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("Invalid submission id: {}", raw)))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/pending", get(list_pending))
        .route("/admin/pending/:id", get(get_pending))
        .route("/admin/approve-submission", post(approve_submission))
        .route("/admin/deny-submission", post(deny_submission))
        .route("/admin/upload", post(direct_upload))
}
