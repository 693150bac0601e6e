//! Message bodies, parts, senders and receipts.
//!
//! A message sent through the Platform API looks like:
//!
//! ```json
//! {
//!   "sender": { "user_id": "alice" },
//!   "parts": [{ "body": "Hello", "mime_type": "text/plain" }]
//! }
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// MIME type of plain-text parts.
pub const TEXT_PLAIN: &str = "text/plain";

// ---------------------------------------------------------------------------
// Outgoing bodies
// ---------------------------------------------------------------------------

/// Who a server-side message is sent as.
///
/// Serialises as `{"user_id": "…"}` or `{"name": "…"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// A registered user of the application.
    UserId(String),
    /// A free-form system name (e.g. `"Bot"`), not tied to a user.
    Name(String),
}

/// One part of a message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    /// Part payload.
    pub body: String,
    /// MIME type of `body`.
    pub mime_type: String,
}

impl MessagePart {
    /// A `text/plain` part.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            mime_type: TEXT_PLAIN.to_string(),
        }
    }
}

/// Push-notification settings attached to a sent message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text shown in the push notification.
    pub text: String,
    /// Optional sound name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

/// Body of `POST /apps/{app}/conversations/{id}/messages`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    /// Sender of the message.
    pub sender: Sender,
    /// Ordered parts.
    pub parts: Vec<MessagePart>,
    /// Optional push notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

impl MessageBody {
    /// Plain-text message sent on behalf of `user_id`.
    pub fn text_from_user(user_id: &str, text: &str) -> Result<Self, ModelError> {
        Self::text(Sender::UserId(require("user_id", user_id)?), text)
    }

    /// Plain-text message sent under a display `name`.
    pub fn text_from_name(name: &str, text: &str) -> Result<Self, ModelError> {
        Self::text(Sender::Name(require("name", name)?), text)
    }

    fn text(sender: Sender, text: &str) -> Result<Self, ModelError> {
        Ok(Self {
            sender,
            parts: vec![MessagePart::text(require("text", text)?)],
            notification: None,
        })
    }

    /// Attach a push notification.
    #[must_use]
    pub fn with_notification(mut self, text: impl Into<String>) -> Self {
        self.notification = Some(Notification {
            text: text.into(),
            sound: None,
        });
        self
    }
}

fn require(field: &str, value: &str) -> Result<String, ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

// ---------------------------------------------------------------------------
// Incoming messages
// ---------------------------------------------------------------------------

/// Reference to the conversation a message belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConversationRef {
    /// `layer:///conversations/<uuid>`.
    pub id: String,
    /// REST URL of the conversation.
    #[serde(default)]
    pub url: Option<String>,
}

/// Sender as reported by the platform.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderInfo {
    /// Set when the sender is a user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Set when the message was sent under a system name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A message as returned by list / get calls.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// `layer:///messages/<uuid>`.
    pub id: String,
    /// REST URL of the message.
    #[serde(default)]
    pub url: Option<String>,
    /// Owning conversation.
    #[serde(default)]
    pub conversation: Option<ConversationRef>,
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    /// Server-side send time.
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    /// Sender.
    #[serde(default)]
    pub sender: SenderInfo,
    /// Whether the requesting user has not read it yet.
    #[serde(default)]
    pub is_unread: bool,
    /// Per-recipient status (`sent`, `delivered`, `read`).
    #[serde(default)]
    pub recipient_status: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// Kind of receipt posted to `/messages/{id}/receipts`.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReceiptType {
    /// The user has read the message.
    Read,
    /// The message reached the user's device.
    Delivery,
}

/// Body of `POST /messages/{id}/receipts`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptRequest {
    /// Receipt kind.
    #[serde(rename = "type")]
    pub receipt_type: ReceiptType,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Paging parameters for message listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQuery {
    /// Maximum number of messages to return.
    pub page_size: Option<u32>,
    /// Return messages older than this message id.
    pub from_id: Option<String>,
}

impl MessageQuery {
    /// Query-string pairs, omitting unset fields.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(size) = self.page_size {
            pairs.push(("page_size", size.to_string()));
        }
        if let Some(from) = &self.from_id {
            pairs.push(("from_id", from.clone()));
        }
        pairs
    }
}
