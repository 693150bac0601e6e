//! Identity token signing.
//!
//! An identity token is an RS256 JWS asserting that the application vouches
//! for a user.  It embeds the single-use nonce handed out by the provider
//! and lives for [`IDENTITY_TOKEN_TTL_SECS`].
//!
//! ```text
//! header: { "alg": "RS256", "cty": "layer-eit;v=1", "kid": <key id>, "typ": "JWT" }
//! claim:  { "exp": iat + 10000, "iat": now, "iss": <provider id>,
//!           "nce": <nonce>, "prn": <user id> }
//! ```

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use layer_models::IdentityClaims;

use crate::config::LayerConfig;
use crate::error::SdkError;

/// Lifetime of an identity token, and therefore of the session built on it.
pub const IDENTITY_TOKEN_TTL_SECS: i64 = 10_000;

/// Content type the provider expects in the JWS header.
pub const IDENTITY_CONTENT_TYPE: &str = "layer-eit;v=1";

/// A signed identity token and the expiry embedded in its claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIdentity {
    /// Compact JWS.
    pub token: String,
    /// Value of the `exp` claim.
    pub expires_at: DateTime<Utc>,
}

/// Signs identity tokens for one provider / key.
#[derive(Clone)]
pub struct IdentitySigner {
    issuer: String,
    key_id: String,
    private_key: String,
}

impl IdentitySigner {
    /// Signer for `issuer` using the PEM RSA key identified by `key_id`.
    pub fn new(
        issuer: impl Into<String>,
        key_id: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            key_id: key_id.into(),
            private_key: private_key.into(),
        }
    }

    /// Signer built from a client configuration.
    pub fn from_config(config: &LayerConfig) -> Self {
        Self::new(&config.provider_id, &config.key_id, &config.private_key)
    }

    /// Sign a token asserting `user_id`, bound to `nonce`, issued at `now`.
    ///
    /// The key is parsed on every call; a malformed key surfaces as
    /// [`SdkError::Signing`].
    pub fn sign(
        &self,
        user_id: &str,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedIdentity, SdkError> {
        if user_id.is_empty() {
            return Err(SdkError::Validation("user id isn't defined".into()));
        }
        if nonce.is_empty() {
            return Err(SdkError::Validation("nonce isn't defined".into()));
        }

        // Rounded to the nearest second.
        let issued_at = (now.timestamp_millis() + 500).div_euclid(1000);
        let expiry = issued_at + IDENTITY_TOKEN_TTL_SECS;

        let claims = IdentityClaims {
            exp: expiry,
            iat: issued_at,
            iss: self.issuer.clone(),
            nce: nonce.to_string(),
            prn: user_id.to_string(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.cty = Some(IDENTITY_CONTENT_TYPE.to_string());
        header.kid = Some(self.key_id.clone());

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        let token = encode(&header, &claims, &key)?;

        let expires_at = DateTime::from_timestamp(expiry, 0).ok_or_else(|| {
            SdkError::Validation(format!("identity token expiry {expiry} is out of range"))
        })?;

        Ok(SignedIdentity { token, expires_at })
    }
}
