//! Error type of the mock provider.
//!
//! [`ProviderError`] implements [`axum::response::IntoResponse`] so handlers
//! can return `Result<…, ProviderError>` directly.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Failures surfaced to SDK clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Malformed request (bad id, wrong app).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or unknown credentials, bad identity token, reused nonce.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A message with the same dedupe id was already accepted.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
        };
        let message = self.to_string();

        tracing::warn!(%status, error = %message, "request rejected");
        (status, Json(json!({ "error": message }))).into_response()
    }
}
