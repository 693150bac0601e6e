//! Mock Layer provider — a local stand-in for the platform endpoints the SDK
//! talks to.
//!
//! It implements the authentication handshake for real:
//!
//! 1. `POST /nonces` hands out single-use nonces.
//! 2. `POST /sessions` verifies the RS256 identity token against the
//!    configured public key, redeems its nonce and opens a session.
//! 3. Session tokens authorize receipts and `GET /websocket`.
//!
//! Messages sent through the Platform API are kept in memory and pushed to
//! every open websocket as `change` packets.

mod auth;
mod config;
mod error;
mod platform;
mod socket;
mod state;

#[cfg(test)]
mod end_to_end;
#[cfg(test)]
mod test_keys;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::config::MockConfig;
use crate::state::ProviderState;

/// Every route of the mock provider.
fn router(state: Arc<ProviderState>) -> Router {
    Router::new()
        .route("/nonces", post(auth::create_nonce))
        .route("/sessions", post(auth::create_session))
        .route("/messages/{id}/receipts", post(platform::post_receipt))
        .route(
            "/apps/{app}/conversations/{cid}/messages",
            post(platform::send_message).get(platform::list_messages),
        )
        .route(
            "/apps/{app}/users/{user}/conversations/{cid}/messages",
            get(platform::list_user_messages),
        )
        .route(
            "/apps/{app}/users/{user}/messages/{mid}",
            get(platform::get_user_message),
        )
        .route("/apps/{app}/users/{user}/badge", get(platform::unread_badge))
        .route("/websocket", get(socket::websocket))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match MockConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let state = match ProviderState::new(&config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!(error = %e, "cannot load identity public key");
            std::process::exit(1);
        }
    };
    info!(app_id = %config.app_id, "identity public key loaded");

    let addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    info!(address = %addr, "mock provider listening");
    axum::serve(listener, router(state))
        .await
        .expect("server error");
}
