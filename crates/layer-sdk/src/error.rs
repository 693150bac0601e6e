//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK.  Nothing is retried or swallowed internally: the
//! variant tells the caller which stage failed and, for transport and
//! signing failures, carries the underlying cause.

use layer_models::ModelError;

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad URL, unreadable key file).
    #[error("configuration error: {0}")]
    Config(String),

    /// A caller-supplied identifier or argument was missing or malformed.
    ///
    /// Detected locally; never reaches the network.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Building or signing the identity token failed.
    #[error("failed to sign identity token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Transport-level HTTP failure (nonce fetch, session exchange, REST call).
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// A socket was requested while no valid session token is held.
    #[error("session token isn't defined")]
    MissingCredential,

    /// The real-time connection could not be constructed.
    #[error("websocket error: {0}")]
    Connection(String),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ModelError> for SdkError {
    fn from(e: ModelError) -> Self {
        SdkError::Validation(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SdkError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        SdkError::Connection(e.to_string())
    }
}
