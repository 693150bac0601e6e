//! Real-time websocket management.
//!
//! The websocket is authenticated by the session token it was opened with
//! (`/websocket?session_token=<token>`, subprotocol `layer-<version>`).
//! [`ConnectionManager`] keeps at most one socket per client and makes
//! sure it always belongs to the current session token:
//!
//! ```text
//! NoSocket ──socket()──▶ Connected(token A)
//! Connected(A) ──socket(), current token A──▶ same handle
//! Connected(A) ──socket(), current token B──▶ close A, open B
//! any state ──socket(), no valid token──▶ Err(MissingCredential), unchanged
//! ```
//!
//! Opening a socket never blocks: the connector hands back a handle at once
//! and the transport connects in the background.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Url;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::credentials::Credential;
use crate::error::SdkError;
use crate::session::SessionNegotiator;

// ---------------------------------------------------------------------------
// Endpoint & events
// ---------------------------------------------------------------------------

/// Where and how a websocket is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEndpoint {
    /// Full URL including the `session_token` query parameter.
    pub url: String,
    /// Websocket subprotocol (`layer-<version>`).
    pub protocol: String,
}

impl SocketEndpoint {
    /// Endpoint for `session_token` under `socket_url`.
    pub fn new(socket_url: &Url, session_token: &str, api_version: &str) -> Result<Self, SdkError> {
        let mut url = crate::provider::join(socket_url, ["websocket"])
            .map_err(|e| SdkError::Connection(format!("cannot build socket URL: {e}")))?;
        url.query_pairs_mut()
            .clear()
            .append_pair("session_token", session_token);
        Ok(Self {
            url: url.into(),
            protocol: format!("layer-{api_version}"),
        })
    }
}

/// Something that happened on a websocket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The handshake completed.
    Opened,
    /// A text frame arrived (a JSON packet from the platform).
    Message(String),
    /// The connection ended, cleanly or not.  Always the last event.
    Closed,
    /// The transport failed; followed by [`SocketEvent::Closed`].
    Error(String),
}

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// A live connection produced by a [`SocketConnector`].
pub trait SocketConnection: Send + Sync {
    /// Queue a text frame.
    fn send_text(&self, text: String) -> Result<(), SdkError>;

    /// Start closing the connection.  Idempotent.
    fn close(&self);
}

/// Opens websocket connections.
///
/// Implementations must return immediately; connecting happens in the
/// background and is reported through `events`.
pub trait SocketConnector: Send + Sync {
    /// Open a connection to `endpoint`, reporting activity on `events`.
    fn open(
        &self,
        endpoint: &SocketEndpoint,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> Result<Box<dyn SocketConnection>, SdkError>;
}

/// Source of the session credential a socket must be bound to.
pub trait CredentialSource: Send + Sync {
    /// The credential, if one is held and still valid.
    fn current_credential(&self) -> Option<Credential>;
}

impl CredentialSource for SessionNegotiator {
    fn current_credential(&self) -> Option<Credential> {
        self.current()
    }
}

// ---------------------------------------------------------------------------
// SocketHandle
// ---------------------------------------------------------------------------

struct HandleInner {
    id: u64,
    token: String,
    endpoint: SocketEndpoint,
    connection: Box<dyn SocketConnection>,
    events: Mutex<Option<mpsc::UnboundedReceiver<SocketEvent>>>,
}

/// A websocket bound to one session token.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct SocketHandle {
    inner: Arc<HandleInner>,
}

impl SocketHandle {
    /// Process-unique id of the underlying connection.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Session token the socket was opened with.
    pub fn token(&self) -> &str {
        &self.inner.token
    }

    /// Endpoint the socket was opened on.
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.inner.endpoint
    }

    /// `true` if both handles refer to the same connection.
    pub fn same_connection(&self, other: &SocketHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Queue a text frame on the socket.
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), SdkError> {
        self.inner.connection.send_text(text.into())
    }

    /// Take the event stream.  Only the first caller gets it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<SocketEvent>> {
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn close(&self) {
        self.inner.connection.close();
    }
}

impl std::fmt::Debug for SocketHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketHandle")
            .field("id", &self.inner.id)
            .field("protocol", &self.inner.endpoint.protocol)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ConnectionManager
// ---------------------------------------------------------------------------

/// Owns the single websocket of a client.
pub struct ConnectionManager {
    connector: Arc<dyn SocketConnector>,
    credentials: Arc<dyn CredentialSource>,
    socket_url: Url,
    api_version: String,
    // Held from the credential read to the swap, so concurrent callers
    // cannot open two sockets for one token or roll back to an older one.
    current: Mutex<Option<SocketHandle>>,
    next_id: AtomicU64,
}

impl ConnectionManager {
    /// Manager with no socket open yet.
    pub fn new(
        connector: Arc<dyn SocketConnector>,
        credentials: Arc<dyn CredentialSource>,
        socket_url: Url,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            credentials,
            socket_url,
            api_version: api_version.into(),
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Socket bound to the current session token.
    ///
    /// Reuses the open socket when its token is still current, otherwise
    /// closes it and opens a new one.  Fails with
    /// [`SdkError::MissingCredential`] when no valid session is held; in that
    /// case nothing is opened or closed.
    pub fn socket(&self) -> Result<SocketHandle, SdkError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        // Read under the lock: a credential read before it may already be
        // stale by the time the swap happens.
        let credential = self
            .credentials
            .current_credential()
            .ok_or(SdkError::MissingCredential)?;

        if let Some(handle) = current.as_ref() {
            if handle.token() == credential.token() {
                debug!(socket_id = handle.id(), "reusing websocket");
                return Ok(handle.clone());
            }
        }

        if let Some(stale) = current.take() {
            info!(socket_id = stale.id(), "session token changed, closing websocket");
            stale.close();
        }

        let handle = self.open(credential.token())?;
        info!(socket_id = handle.id(), "websocket opened");
        *current = Some(handle.clone());
        Ok(handle)
    }

    /// The open socket, if any, without checking the session.
    pub fn current(&self) -> Option<SocketHandle> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Close the open socket, if any.
    pub fn disconnect(&self) {
        if let Some(handle) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            info!(socket_id = handle.id(), "closing websocket");
            handle.close();
        }
    }

    fn open(&self, token: &str) -> Result<SocketHandle, SdkError> {
        let endpoint = SocketEndpoint::new(&self.socket_url, token, &self.api_version)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = self.connector.open(&endpoint, tx)?;
        Ok(SocketHandle {
            inner: Arc::new(HandleInner {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                token: token.to_string(),
                endpoint,
                connection,
                events: Mutex::new(Some(rx)),
            }),
        })
    }
}
