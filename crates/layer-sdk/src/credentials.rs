//! Session credential held by a client.

use chrono::{DateTime, Utc};

/// A session token together with the instant it stops being usable.
///
/// Token and expiry always travel together: the negotiator replaces the
/// whole value, never one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Pair a session token with its expiry.
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// The opaque session token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// First instant at which the token must no longer be used.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
