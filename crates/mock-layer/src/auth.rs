//! Authentication handshake: nonces, identity verification and sessions.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{AUTHORIZATION, HeaderMap};
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use layer_models::{IdentityClaims, NonceResponse, SessionRequest, SessionResponse};
use tracing::info;

use crate::error::ProviderError;
use crate::state::ProviderState;

/// `cty` header value of an identity token.
const IDENTITY_CONTENT_TYPE: &str = "layer-eit;v=1";

/// `POST /nonces` — hand out a single-use nonce.
pub async fn create_nonce(State(state): State<Arc<ProviderState>>) -> (StatusCode, Json<NonceResponse>) {
    let nonce = state.issue_nonce();
    tracing::debug!(%nonce, "nonce issued");
    (StatusCode::CREATED, Json(NonceResponse { nonce }))
}

/// `POST /sessions` — exchange a signed identity token for a session token.
pub async fn create_session(
    State(state): State<Arc<ProviderState>>,
    Json(req): Json<SessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ProviderError> {
    if req.app_id != state.app_id {
        return Err(ProviderError::BadRequest(format!(
            "unknown app_id {}",
            req.app_id
        )));
    }

    let claims = verify_identity(&state, &req.identity_token)?;
    if !state.redeem_nonce(&claims.nce) {
        return Err(ProviderError::Unauthorized("unknown or reused nonce".into()));
    }

    let session_token = state.open_session(&claims.prn);
    info!(user_id = %claims.prn, issuer = %claims.iss, "session opened");

    Ok((StatusCode::CREATED, Json(SessionResponse { session_token })))
}

/// Check signature, content type and expiry of an identity token.
pub fn verify_identity(state: &ProviderState, token: &str) -> Result<IdentityClaims, ProviderError> {
    let header = decode_header(token)
        .map_err(|e| ProviderError::Unauthorized(format!("malformed identity token: {e}")))?;
    if header.cty.as_deref() != Some(IDENTITY_CONTENT_TYPE) {
        return Err(ProviderError::Unauthorized(format!(
            "unexpected content type {:?}",
            header.cty
        )));
    }

    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_aud = false;
    let data = decode::<IdentityClaims>(token, &state.decoding_key, &validation)
        .map_err(|e| ProviderError::Unauthorized(format!("invalid identity token: {e}")))?;

    if data.claims.prn.is_empty() {
        return Err(ProviderError::Unauthorized("identity token names no user".into()));
    }
    Ok(data.claims)
}

/// User behind a `Layer session-token="…"` authorization header.
pub fn session_user(state: &ProviderState, headers: &HeaderMap) -> Result<String, ProviderError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Layer session-token=\""))
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(|| ProviderError::Unauthorized("missing session token".into()))?;

    state
        .session_user(token)
        .ok_or_else(|| ProviderError::Unauthorized("unknown session token".into()))
}

/// Reject Platform API calls without the configured bearer token.
pub fn require_platform(state: &ProviderState, headers: &HeaderMap) -> Result<(), ProviderError> {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == state.platform_token => Ok(()),
        Some(_) => Err(ProviderError::Unauthorized("invalid platform token".into())),
        None => Err(ProviderError::Unauthorized("missing platform token".into())),
    }
}
