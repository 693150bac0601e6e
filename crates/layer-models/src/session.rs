//! Request / response bodies of the authentication handshake.
//!
//! ```text
//! POST /nonces    →  { "nonce": "…" }
//! POST /sessions  ←  { "app_id": "…", "identity_token": "…" }
//!                 →  { "session_token": "…" }
//! ```

use serde::{Deserialize, Serialize};

/// Response of `POST /nonces`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NonceResponse {
    /// Single-use value to embed in the identity token.
    pub nonce: String,
}

/// Body of `POST /sessions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Application the session is opened for.
    pub app_id: String,
    /// Signed identity assertion (compact JWS).
    pub identity_token: String,
}

/// Response of `POST /sessions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    /// Opaque session token used by the Client API and the websocket.
    pub session_token: String,
}

/// Claim set of a Layer identity token.
///
/// Field names are the provider's wire names: `nce` carries the nonce and
/// `prn` the principal (user id).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Issuer (provider id).
    pub iss: String,
    /// Nonce obtained from `POST /nonces`.
    pub nce: String,
    /// Principal: the user id being authenticated.
    pub prn: String,
}
