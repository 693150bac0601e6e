//! # Layer SDK
//!
//! Client SDK for the **Layer** messaging platform.
//!
//! The SDK provides:
//!
//! * [`LayerClient`] — one application client: session, websocket and
//!   REST resources.
//! * [`SessionNegotiator`] — nonce → signed identity token → session
//!   token, cached until expiry.
//! * [`IdentitySigner`] — RS256 identity tokens.
//! * [`ConnectionManager`] — the client's single websocket, rotated when
//!   the session token changes.
//! * [`MessagesResource`] — send / list / receipt calls.
//! * [`SdkError`] — unified error type for all SDK operations.
//!
//! Wire types from [`layer_models`] are re-exported for convenience.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use layer_sdk::{LayerClient, LayerConfig};
//!
//! # async fn run() -> Result<(), layer_sdk::SdkError> {
//! let pem = std::fs::read_to_string("layer-key.pem")?;
//! let config = LayerConfig::new("app-id", "provider-id", "key-id", pem);
//! let client = LayerClient::new(config)?;
//!
//! let token = client.session_token("user-42").await?;
//! client
//!     .messages()
//!     .set_read("user-42", "layer:///messages/940de862-3c96-11e4-baad-164230d1df67")
//!     .await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod headers;
pub mod identity;
pub mod messages;
pub mod platform;
pub mod provider;
pub mod session;
pub mod socket;
pub mod ws;

#[cfg(test)]
mod test_support;

pub use client::{LayerClient, LayerClientBuilder};
pub use clock::{is_valid, Clock, ManualClock, SystemClock};
pub use config::LayerConfig;
pub use credentials::Credential;
pub use error::SdkError;
pub use identity::{IdentitySigner, SignedIdentity};
pub use messages::MessagesResource;
pub use session::SessionNegotiator;
pub use socket::{
    ConnectionManager, CredentialSource, SocketConnection, SocketConnector, SocketEndpoint,
    SocketEvent, SocketHandle,
};
pub use ws::WsConnector;

// Re-export wire types from layer-models for ergonomic usage.
pub use layer_models::{
    ConversationId, Message, MessageBody, MessageId, MessagePart, MessageQuery, ReceiptType,
    Sender, UnreadBadge,
};
