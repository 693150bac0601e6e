//! The SDK against a live mock provider on a loopback port.

use std::sync::Arc;
use std::time::Duration;

use layer_sdk::{LayerClient, LayerConfig, SdkError, SocketEvent};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::router;
use crate::state::ProviderState;
use crate::state::tests::state;
use crate::test_keys::keys;

const CONVERSATION: &str = "f3cc7b32-3c92-11e4-baad-164230d1df67";

async fn start() -> (LayerConfig, Arc<ProviderState>) {
    let state = Arc::new(state());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::clone(&state));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = LayerConfig::new("app-1", "provider-1", "key-1", keys().private_pem.clone())
        .with_api_url(format!("http://{addr}"))
        .with_socket_url(format!("ws://{addr}"))
        .with_platform_token("platform-secret");
    (config, state)
}

async fn next_event(events: &mut UnboundedReceiver<SocketEvent>) -> SocketEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("socket event in time")
        .expect("event stream open")
}

#[tokio::test]
async fn session_is_negotiated_and_reused() {
    let (config, state) = start().await;
    let client = LayerClient::new(config).unwrap();

    let token = client.session_token("bob").await.unwrap();
    assert_eq!(state.session_user(&token).as_deref(), Some("bob"));
    assert_eq!(client.session_token("bob").await.unwrap(), token);
}

#[tokio::test]
async fn unknown_app_is_refused_by_provider() {
    let (mut config, _state) = start().await;
    config.app_id = "other-app".into();
    let client = LayerClient::new(config).unwrap();

    let err = client.session_token("bob").await.unwrap_err();
    assert!(matches!(err, SdkError::Api { status: 400, .. }));
}

#[tokio::test]
async fn websocket_receives_sent_messages() {
    let (config, _state) = start().await;
    let client = LayerClient::new(config).unwrap();

    let socket = client.connect("bob").await.unwrap();
    let mut events = socket.take_events().unwrap();
    assert_eq!(next_event(&mut events).await, SocketEvent::Opened);

    let sent = client
        .messages()
        .send_text_from_user(CONVERSATION, "alice", "Hello Bob")
        .await
        .unwrap();

    let SocketEvent::Message(packet) = next_event(&mut events).await else {
        panic!("expected a change packet");
    };
    let packet: serde_json::Value = serde_json::from_str(&packet).unwrap();
    assert_eq!(packet["body"]["object"]["id"], sent.id);
    assert_eq!(packet["body"]["data"]["parts"][0]["body"], "Hello Bob");

    client.disconnect();
    assert_eq!(next_event(&mut events).await, SocketEvent::Closed);
}

#[tokio::test]
async fn read_receipt_clears_badge() {
    let (config, _state) = start().await;
    let client = LayerClient::new(config).unwrap();

    let sent = client
        .messages()
        .send_text_from_user(CONVERSATION, "alice", "Hello Bob")
        .await
        .unwrap();
    assert_eq!(client.unread_badge("bob").await.unwrap().unread_message_count, 1);

    client.messages().set_read("bob", &sent.id).await.unwrap();

    assert_eq!(client.unread_badge("bob").await.unwrap().unread_message_count, 0);
    let seen = client.messages().get_from_user("bob", &sent.id).await.unwrap();
    assert!(!seen.is_unread);
}
