//! Request headers expected by the Layer APIs.
//!
//! ```text
//! Accept:        application/vnd.layer+json; version=1.0
//! Authorization: Layer session-token="<token>"      (Client API)
//! Authorization: Bearer <platform token>            (Platform API)
//! Content-Type:  application/json
//! ```

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::SdkError;

/// `Accept` value for the given API version.
pub fn accept(version: &str) -> String {
    format!("application/vnd.layer+json; version={version}")
}

/// `Authorization` value for a Client API call under a session token.
pub fn session_authorization(session_token: &str) -> String {
    format!("Layer session-token=\"{session_token}\"")
}

/// `Authorization` value for a Platform API call.
pub fn platform_authorization(platform_token: &str) -> String {
    format!("Bearer {platform_token}")
}

/// Headers of an unauthenticated call (`/nonces`, `/sessions`).
pub fn base(version: &str) -> Result<HeaderMap, SdkError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, value(&accept(version))?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Headers of a Client API call.
pub fn session(version: &str, session_token: &str) -> Result<HeaderMap, SdkError> {
    let mut headers = base(version)?;
    headers.insert(AUTHORIZATION, value(&session_authorization(session_token))?);
    Ok(headers)
}

/// Headers of a Platform API call.
pub fn platform(version: &str, platform_token: &str) -> Result<HeaderMap, SdkError> {
    let mut headers = base(version)?;
    headers.insert(AUTHORIZATION, value(&platform_authorization(platform_token))?);
    Ok(headers)
}

// The raw value may carry a token, so it is kept out of the error.
fn value(raw: &str) -> Result<HeaderValue, SdkError> {
    HeaderValue::from_str(raw)
        .map_err(|_| SdkError::Validation("header value contains invalid characters".into()))
}
