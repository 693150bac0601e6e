//! `GET /websocket` — push change packets to authenticated clients.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::state::ProviderState;

/// Subprotocols the socket speaks.
const PROTOCOLS: [&str; 1] = ["layer-1.0"];

/// Query of `GET /websocket`.
#[derive(Debug, Deserialize)]
pub struct SocketParams {
    session_token: String,
}

/// Upgrade to a websocket bound to the user of `session_token`.
pub async fn websocket(
    State(state): State<Arc<ProviderState>>,
    Query(params): Query<SocketParams>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, ProviderError> {
    let user_id = state
        .session_user(&params.session_token)
        .ok_or_else(|| ProviderError::Unauthorized("unknown session token".into()))?;

    // Subscribe before answering so nothing sent after the handshake is missed.
    let packets = state.subscribe();
    info!(%user_id, "websocket accepted");

    Ok(upgrade
        .protocols(PROTOCOLS)
        .on_upgrade(move |socket| serve(socket, packets, user_id)))
}

async fn serve(mut socket: WebSocket, mut packets: broadcast::Receiver<String>, user_id: String) {
    loop {
        tokio::select! {
            packet = packets.recv() => match packet {
                Ok(packet) => {
                    if socket.send(Message::Text(packet.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%user_id, skipped, "websocket lagging, packets dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            frame = socket.recv() => match frame {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(Message::Text(text))) => {
                    debug!(%user_id, text = text.as_str(), "client packet ignored");
                }
                Some(Ok(_)) => {}
            },
        }
    }
    info!(%user_id, "websocket closed");
}
