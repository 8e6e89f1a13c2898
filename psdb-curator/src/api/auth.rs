//! Request identity
//!
//! Users authenticate with an external service that forwards the user id in
//! `x-user-id`. Admin routes additionally require `x-admin-token` to match
//! the configured token; with no token configured the check is disabled.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{ApiError, AppState};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin guard middleware
pub async fn admin_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if provided != Some(expected) {
        warn!(path = %request.uri().path(), "Rejected admin request without a valid token");
        return Err(ApiError::Unauthorized("Admin token required".to_string()));
    }

    Ok(next.run(request).await)
}

/// Submitting user taken from `x-user-id`, if present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitter(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for Submitter
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Submitter(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|id| Submitter(Some(id)))
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} header", USER_ID_HEADER)))
    }
}
