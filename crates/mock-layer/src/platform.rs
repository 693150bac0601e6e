//! Message, receipt and badge endpoints.
//!
//! Receipts are posted by users through the Client API (session token);
//! everything under `/apps/{app}` is the Platform API (bearer token).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{HeaderMap, IF_NONE_MATCH};
use layer_models::{
    ConversationId, DedupeId, Message, MessageBody, MessageId, ReceiptRequest, UnreadBadge,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::{require_platform, session_user};
use crate::error::ProviderError;
use crate::state::ProviderState;

/// Paging parameters of message listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page_size: Option<usize>,
    from_id: Option<String>,
}

impl ListParams {
    fn from_id(&self) -> Result<Option<MessageId>, ProviderError> {
        self.from_id
            .as_deref()
            .map(|id| id.parse().map_err(|e| ProviderError::BadRequest(format!("{e}"))))
            .transpose()
    }
}

fn conversation_id(raw: &str) -> Result<ConversationId, ProviderError> {
    raw.parse()
        .map_err(|e| ProviderError::BadRequest(format!("{e}")))
}

fn message_id(raw: &str) -> Result<MessageId, ProviderError> {
    raw.parse()
        .map_err(|e| ProviderError::BadRequest(format!("{e}")))
}

fn require_app(state: &ProviderState, app: &str) -> Result<(), ProviderError> {
    if app == state.app_id {
        Ok(())
    } else {
        Err(ProviderError::NotFound(format!("app {app}")))
    }
}

// ---------------------------------------------------------------------------
// Client API
// ---------------------------------------------------------------------------

/// `POST /messages/{id}/receipts` — record a read / delivery receipt.
pub async fn post_receipt(
    State(state): State<Arc<ProviderState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ReceiptRequest>,
) -> Result<StatusCode, ProviderError> {
    let user_id = session_user(&state, &headers)?;
    let id = message_id(&id)?;

    if !state.record_receipt(id, &user_id, req.receipt_type) {
        return Err(ProviderError::NotFound(format!("message {id}")));
    }
    info!(message = %id, %user_id, receipt = %req.receipt_type, "receipt recorded");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Platform API
// ---------------------------------------------------------------------------

/// `POST /apps/{app}/conversations/{cid}/messages` — send a message.
pub async fn send_message(
    State(state): State<Arc<ProviderState>>,
    Path((app, cid)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<MessageBody>,
) -> Result<(StatusCode, Json<Message>), ProviderError> {
    require_platform(&state, &headers)?;
    require_app(&state, &app)?;
    let conversation = conversation_id(&cid)?;

    let dedupe = headers
        .get(IF_NONE_MATCH)
        .map(|v| {
            v.to_str()
                .ok()
                .and_then(|s| s.parse::<DedupeId>().ok())
                .map(|d| d.to_string())
                .ok_or_else(|| ProviderError::BadRequest("dedupe id must be a UUID".into()))
        })
        .transpose()?;

    let message = state
        .store_message(conversation, body, dedupe)
        .ok_or_else(|| ProviderError::Conflict("dedupe id already used".into()))?;

    info!(%conversation, message = %message.id, "message stored");
    Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /apps/{app}/conversations/{cid}/messages`.
pub async fn list_messages(
    State(state): State<Arc<ProviderState>>,
    Path((app, cid)): Path<(String, String)>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Json<Vec<Message>>, ProviderError> {
    require_platform(&state, &headers)?;
    require_app(&state, &app)?;
    let conversation = conversation_id(&cid)?;
    let from = params.from_id()?;

    Ok(Json(state.list_messages(conversation, None, params.page_size, from)))
}

/// `GET /apps/{app}/users/{user}/conversations/{cid}/messages`.
pub async fn list_user_messages(
    State(state): State<Arc<ProviderState>>,
    Path((app, user, cid)): Path<(String, String, String)>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Json<Vec<Message>>, ProviderError> {
    require_platform(&state, &headers)?;
    require_app(&state, &app)?;
    let conversation = conversation_id(&cid)?;
    let from = params.from_id()?;

    Ok(Json(state.list_messages(
        conversation,
        Some(&user),
        params.page_size,
        from,
    )))
}

/// `GET /apps/{app}/users/{user}/messages/{mid}`.
pub async fn get_user_message(
    State(state): State<Arc<ProviderState>>,
    Path((app, user, mid)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<Message>, ProviderError> {
    require_platform(&state, &headers)?;
    require_app(&state, &app)?;
    let id = message_id(&mid)?;

    state
        .find_message(id, &user)
        .map(Json)
        .ok_or_else(|| ProviderError::NotFound(format!("message {id}")))
}

/// `GET /apps/{app}/users/{user}/badge`.
pub async fn unread_badge(
    State(state): State<Arc<ProviderState>>,
    Path((app, user)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<UnreadBadge>, ProviderError> {
    require_platform(&state, &headers)?;
    require_app(&state, &app)?;
    Ok(Json(state.unread_badge(&user)))
}
