//! Session negotiation and the cached session credential.
//!
//! Obtaining a session takes two round-trips:
//!
//! 1. `POST /nonces` for a single-use nonce.
//! 2. Sign an identity token over that nonce ([`IdentitySigner`]).
//! 3. `POST /sessions` to exchange the identity token for a session token.
//!
//! The resulting [`Credential`] is cached until the identity token's own
//! expiry; while it is valid no network call is made.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::clock::{is_valid, Clock};
use crate::credentials::Credential;
use crate::error::SdkError;
use crate::identity::IdentitySigner;
use crate::provider::ProviderApi;

/// The credential together with the user it was negotiated for.
#[derive(Debug, Clone)]
struct CachedSession {
    user_id: String,
    credential: Credential,
}

/// Negotiates and caches the session credential of one client.
///
/// Negotiations are serialized: a caller that finds the cache empty waits
/// for any negotiation already running, then re-checks the cache before
/// starting its own.  Concurrent callers therefore share one negotiation,
/// and an older negotiation can never overwrite a newer credential.
pub struct SessionNegotiator {
    provider: ProviderApi,
    signer: IdentitySigner,
    clock: Arc<dyn Clock>,
    cached: RwLock<Option<CachedSession>>,
    negotiation: Mutex<()>,
}

impl SessionNegotiator {
    /// Build a negotiator with an empty cache.
    pub fn new(provider: ProviderApi, signer: IdentitySigner, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            signer,
            clock,
            cached: RwLock::new(None),
            negotiation: Mutex::new(()),
        }
    }

    /// The cached credential, if one is held and still valid now.
    pub fn current(&self) -> Option<Credential> {
        let cached = self.cached.read().unwrap_or_else(PoisonError::into_inner);
        cached
            .as_ref()
            .map(|s| &s.credential)
            .filter(|c| is_valid(Some(c), self.clock.now()))
            .cloned()
    }

    /// Session token for `user_id`, negotiating one if needed.
    pub async fn session_token(&self, user_id: &str) -> Result<String, SdkError> {
        self.session_credential(user_id)
            .await
            .map(|c| c.token().to_string())
    }

    /// Session credential for `user_id`, negotiating one if needed.
    ///
    /// A valid cached credential for the same user is returned without any
    /// network call.  On failure the cache is left untouched.
    pub async fn session_credential(&self, user_id: &str) -> Result<Credential, SdkError> {
        if user_id.trim().is_empty() {
            return Err(SdkError::Validation("user id isn't defined".into()));
        }

        if let Some(credential) = self.cached_for(user_id) {
            debug!(user_id, "reusing cached session token");
            return Ok(credential);
        }

        let _guard = self.negotiation.lock().await;

        // Another caller may have finished a negotiation while we waited.
        if let Some(credential) = self.cached_for(user_id) {
            debug!(user_id, "session negotiated by a concurrent caller");
            return Ok(credential);
        }

        let credential = self.negotiate(user_id).await?;

        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(CachedSession {
            user_id: user_id.to_string(),
            credential: credential.clone(),
        });

        info!(
            user_id,
            expires_at = %credential.expires_at(),
            "session token obtained"
        );
        Ok(credential)
    }

    fn cached_for(&self, user_id: &str) -> Option<Credential> {
        let now = self.clock.now();
        let cached = self.cached.read().unwrap_or_else(PoisonError::into_inner);
        cached
            .as_ref()
            .filter(|s| s.user_id == user_id && is_valid(Some(&s.credential), now))
            .map(|s| s.credential.clone())
    }

    /// nonce → sign → exchange, strictly in that order.
    async fn negotiate(&self, user_id: &str) -> Result<Credential, SdkError> {
        debug!(user_id, "requesting nonce");
        let nonce = self.provider.request_nonce().await?;

        let identity = self.signer.sign(user_id, &nonce, self.clock.now())?;

        debug!(user_id, "exchanging identity token for a session");
        let session_token = self.provider.create_session(&identity.token).await?;

        // Lifetime comes from the identity token we signed, not the server.
        Ok(Credential::new(session_token, identity.expires_at))
    }
}
