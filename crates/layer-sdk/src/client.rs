//! High-level client for the Layer platform.
//!
//! [`LayerClient`] bundles everything one application instance needs: the
//! session negotiator, the websocket manager and the REST resources.  All
//! state lives in the client, so several clients can run side by side.
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use layer_sdk::{LayerClient, LayerConfig, SocketEvent};
//!
//! # async fn run() -> Result<(), layer_sdk::SdkError> {
//! let client = LayerClient::new(LayerConfig::from_env()?)?;
//!
//! // Negotiates a session on first use, then serves it from cache.
//! let token = client.session_token("user-42").await?;
//!
//! // Websocket bound to that session.
//! let socket = client.socket()?;
//! let mut events = socket.take_events().expect("fresh socket");
//! while let Some(event) = events.recv().await {
//!     if let SocketEvent::Message(packet) = event {
//!         println!("{packet}");
//!     }
//! }
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use layer_models::UnreadBadge;

use crate::clock::{Clock, SystemClock};
use crate::config::LayerConfig;
use crate::credentials::Credential;
use crate::error::SdkError;
use crate::identity::IdentitySigner;
use crate::messages::MessagesResource;
use crate::platform::PlatformApi;
use crate::provider::ProviderApi;
use crate::session::SessionNegotiator;
use crate::socket::{ConnectionManager, CredentialSource, SocketConnector, SocketHandle};
use crate::ws::WsConnector;

/// A Layer application client.
pub struct LayerClient {
    config: LayerConfig,
    session: Arc<SessionNegotiator>,
    connections: ConnectionManager,
    messages: MessagesResource,
    platform: PlatformApi,
}

impl LayerClient {
    /// Client with the wall clock and the websocket transport.
    pub fn new(config: LayerConfig) -> Result<Self, SdkError> {
        Self::builder(config).build()
    }

    /// Builder for overriding the clock, websocket transport or HTTP client.
    pub fn builder(config: LayerConfig) -> LayerClientBuilder {
        LayerClientBuilder {
            config,
            clock: None,
            connector: None,
            http: None,
        }
    }

    // ------------------------------------------------------------------
    // Session & socket
    // ------------------------------------------------------------------

    /// Session token for `user_id`; cached until it expires.
    pub async fn session_token(&self, user_id: &str) -> Result<String, SdkError> {
        self.session.session_token(user_id).await
    }

    /// Session credential (token and expiry) for `user_id`.
    pub async fn session_credential(&self, user_id: &str) -> Result<Credential, SdkError> {
        self.session.session_credential(user_id).await
    }

    /// Websocket bound to the current session.
    ///
    /// Requires a session to have been negotiated; see [`Self::connect`].
    pub fn socket(&self) -> Result<SocketHandle, SdkError> {
        self.connections.socket()
    }

    /// Negotiate (or reuse) a session for `user_id`, then return its websocket.
    pub async fn connect(&self, user_id: &str) -> Result<SocketHandle, SdkError> {
        self.session.session_credential(user_id).await?;
        self.connections.socket()
    }

    /// Close the websocket, if one is open.
    pub fn disconnect(&self) {
        self.connections.disconnect();
    }

    // ------------------------------------------------------------------
    // REST resources
    // ------------------------------------------------------------------

    /// Message operations.
    pub fn messages(&self) -> &MessagesResource {
        &self.messages
    }

    /// Unread counters of `user_id`.
    pub async fn unread_badge(&self, user_id: &str) -> Result<UnreadBadge, SdkError> {
        if user_id.trim().is_empty() {
            return Err(SdkError::Validation("user id isn't defined".into()));
        }
        tracing::debug!(user_id, "fetching unread badge");
        self.platform.get(&["users", user_id, "badge"], &[]).await
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The configuration this client was built with.
    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// The session negotiator, for collaborators that authorize their own calls.
    pub fn session(&self) -> &Arc<SessionNegotiator> {
        &self.session
    }
}

/// Builder returned by [`LayerClient::builder`].
pub struct LayerClientBuilder {
    config: LayerConfig,
    clock: Option<Arc<dyn Clock>>,
    connector: Option<Arc<dyn SocketConnector>>,
    http: Option<reqwest::Client>,
}

impl LayerClientBuilder {
    /// Use `clock` for expiry decisions and token timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use `connector` to open websockets.
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn SocketConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Share an existing HTTP client.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Validate the configuration and assemble the client.
    pub fn build(self) -> Result<LayerClient, SdkError> {
        let config = self.config;
        config.validate()?;

        let http = self.http.unwrap_or_default();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let connector = self.connector.unwrap_or_else(|| Arc::new(WsConnector));

        let session = Arc::new(SessionNegotiator::new(
            ProviderApi::new(http.clone(), &config)?,
            IdentitySigner::from_config(&config),
            clock,
        ));

        let socket_url = reqwest::Url::parse(&config.socket_url).map_err(|e| {
            SdkError::Config(format!("invalid socket_url {}: {e}", config.socket_url))
        })?;
        let connections = ConnectionManager::new(
            connector,
            Arc::clone(&session) as Arc<dyn CredentialSource>,
            socket_url,
            &config.api_version,
        );

        let platform = PlatformApi::new(http.clone(), &config)?;
        let messages =
            MessagesResource::new(http, &config, platform.clone(), Arc::clone(&session))?;

        Ok(LayerClient {
            config,
            session,
            connections,
            messages,
            platform,
        })
    }
}
