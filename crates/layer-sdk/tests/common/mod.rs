//! In-process fake of the Layer REST endpoints used by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use layer_models::{NonceResponse, SessionRequest, SessionResponse};
use layer_sdk::{
    LayerConfig, SdkError, SocketConnection, SocketConnector, SocketEndpoint, SocketEvent,
};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

pub struct TestKeys {
    pub private_pem: String,
    pub public_pem: String,
}

pub fn keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        TestKeys {
            private_pem: private
                .to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
                .unwrap()
                .to_string(),
            public_pem: public.to_pkcs1_pem(rsa::pkcs8::LineEnding::LF).unwrap(),
        }
    })
}

// ---------------------------------------------------------------------------
// Fake provider
// ---------------------------------------------------------------------------

/// A request the fake recorded.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub if_none_match: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct FakeState {
    pub nonce_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    /// Nonces handed out in order; `nonce-<n>` once exhausted.
    pub nonces: Mutex<VecDeque<String>>,
    /// Session tokens handed out in order; `sess-<n>` once exhausted.
    pub session_tokens: Mutex<VecDeque<String>>,
    pub identity_tokens: Mutex<Vec<String>>,
    pub fail_nonce: AtomicBool,
    pub fail_session: AtomicBool,
    pub session_delay_ms: AtomicU64,
    pub requests: Mutex<Vec<Recorded>>,
}

impl FakeState {
    pub fn nonce_calls(&self) -> usize {
        self.nonce_calls.load(Ordering::SeqCst)
    }

    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    pub fn script_nonce(&self, nonce: &str) {
        self.nonces.lock().unwrap().push_back(nonce.to_string());
    }

    pub fn script_session(&self, token: &str) {
        self.session_tokens.lock().unwrap().push_back(token.to_string());
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        self.requests.lock().unwrap().push(Recorded {
            path,
            authorization: header("authorization"),
            accept: header("accept"),
            if_none_match: header("if-none-match"),
            body,
        });
    }
}

pub struct FakeProvider {
    pub base_url: String,
    pub state: Arc<FakeState>,
}

impl FakeProvider {
    pub fn config(&self) -> LayerConfig {
        LayerConfig::new("app-1", "provider-1", "key-1", keys().private_pem.clone())
            .with_api_url(&self.base_url)
            .with_platform_token("platform-secret")
    }
}

pub async fn spawn() -> FakeProvider {
    let state = Arc::new(FakeState::default());
    let app = Router::new()
        .route("/nonces", post(nonces))
        .route("/sessions", post(sessions))
        .route("/messages/{id}/receipts", post(receipts))
        .route(
            "/apps/{app}/conversations/{cid}/messages",
            post(send_message).get(list_messages),
        )
        .route("/apps/{app}/users/{user}/badge", get(badge))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeProvider {
        base_url: format!("http://{addr}"),
        state,
    }
}

async fn nonces(State(state): State<Arc<FakeState>>) -> Response {
    let n = state.nonce_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if state.fail_nonce.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "nonce service down").into_response();
    }
    let nonce = state
        .nonces
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| format!("nonce-{n}"));
    Json(NonceResponse { nonce }).into_response()
}

async fn sessions(State(state): State<Arc<FakeState>>, Json(req): Json<SessionRequest>) -> Response {
    let n = state.session_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let delay = state.session_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if state.fail_session.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, "invalid identity token").into_response();
    }
    assert_eq!(req.app_id, "app-1");
    state.identity_tokens.lock().unwrap().push(req.identity_token);
    let session_token = state
        .session_tokens
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| format!("sess-{n}"));
    Json(SessionResponse { session_token }).into_response()
}

async fn receipts(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state.record(format!("/messages/{id}/receipts"), &headers, body);
    StatusCode::NO_CONTENT
}

async fn send_message(
    State(state): State<Arc<FakeState>>,
    Path((app, cid)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record(
        format!("/apps/{app}/conversations/{cid}/messages"),
        &headers,
        body.clone(),
    );
    (
        StatusCode::CREATED,
        Json(json!({
            "id": "layer:///messages/940de862-3c96-11e4-baad-164230d1df67",
            "conversation": { "id": format!("layer:///conversations/{cid}") },
            "parts": body["parts"],
            "sender": body["sender"],
            "sent_at": "2014-09-15T04:44:47+00:00",
            "recipient_status": { "alice": "read" }
        })),
    )
}

async fn list_messages(
    State(state): State<Arc<FakeState>>,
    Path((app, cid)): Path<(String, String)>,
    headers: HeaderMap,
    axum::extract::RawQuery(query): axum::extract::RawQuery,
) -> Json<Value> {
    state.record(
        format!(
            "/apps/{app}/conversations/{cid}/messages?{}",
            query.unwrap_or_default()
        ),
        &headers,
        Value::Null,
    );
    Json(json!([
        {
            "id": "layer:///messages/940de862-3c96-11e4-baad-164230d1df67",
            "parts": [{ "body": "hi", "mime_type": "text/plain" }],
            "sender": { "user_id": "alice" }
        }
    ]))
}

async fn badge(
    State(state): State<Arc<FakeState>>,
    Path((app, user)): Path<(String, String)>,
    headers: HeaderMap,
) -> Json<Value> {
    state.record(format!("/apps/{app}/users/{user}/badge"), &headers, Value::Null);
    Json(json!({
        "unread_conversation_count": 2,
        "unread_message_count": 5,
        "unread_announcement_count": 0
    }))
}

// ---------------------------------------------------------------------------
// Counting socket connector
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct SocketLog {
    pub opened: Mutex<Vec<SocketEndpoint>>,
    pub closed: AtomicUsize,
}

impl SocketLog {
    pub fn opened(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct CountingConnector {
    pub log: Arc<SocketLog>,
}

struct CountingConnection {
    log: Arc<SocketLog>,
}

impl SocketConnection for CountingConnection {
    fn send_text(&self, _text: String) -> Result<(), SdkError> {
        Ok(())
    }

    fn close(&self) {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl SocketConnector for CountingConnector {
    fn open(
        &self,
        endpoint: &SocketEndpoint,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> Result<Box<dyn SocketConnection>, SdkError> {
        self.log.opened.lock().unwrap().push(endpoint.clone());
        let _ = events.send(SocketEvent::Opened);
        Ok(Box::new(CountingConnection {
            log: Arc::clone(&self.log),
        }))
    }
}
