//! Public submission endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::auth::Submitter;
use super::intake;
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub submission_id: Uuid,
}

/// POST /submit
///
/// Multipart form of document fields and files; queues the submission for
/// admin review.
pub async fn submit(
    State(state): State<AppState>,
    Submitter(user_id): Submitter,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let form = intake::read_form(
        state.pipeline.files(),
        state.config.max_upload_bytes,
        multipart,
    )
    .await?;

    let submission_id = state.pipeline.submit(&form, user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: "Submission received and queued for review".to_string(),
            submission_id,
        }),
    ))
}

pub fn submit_routes() -> Router<AppState> {
    Router::new().route("/submit", post(submit))
}
