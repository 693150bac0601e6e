//! Resource identifiers.
//!
//! Layer addresses conversations and messages by UUID.  The platform
//! returns them as `layer:///conversations/<uuid>` URLs while REST paths
//! take the bare UUID, so both forms are accepted on input and the bare
//! UUID is what ends up in request paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelError;

/// URL scheme prefix used by the platform for resource ids.
pub const LAYER_URL_PREFIX: &str = "layer:///";

/// Parse either a bare UUID or `layer:///{collection}/<uuid>`.
fn parse_layer_id(kind: &'static str, collection: &str, value: &str) -> Result<Uuid, ModelError> {
    let trimmed = value.trim();
    let candidate = trimmed
        .strip_prefix(LAYER_URL_PREFIX)
        .map(|rest| {
            rest.strip_prefix(collection)
                .and_then(|r| r.strip_prefix('/'))
                .unwrap_or("")
        })
        .unwrap_or(trimmed);

    Uuid::parse_str(candidate).map_err(|_| ModelError::InvalidIdentifier {
        kind,
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// ConversationId
// ---------------------------------------------------------------------------

/// Identifier of a conversation.
///
/// # Examples
///
/// ```
/// use layer_models::ConversationId;
///
/// let a: ConversationId = "layer:///conversations/f3cc7b32-3c92-11e4-baad-164230d1df67"
///     .parse()
///     .unwrap();
/// let b: ConversationId = "f3cc7b32-3c92-11e4-baad-164230d1df67".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "f3cc7b32-3c92-11e4-baad-164230d1df67");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationId(Uuid);

impl ConversationId {
    /// Wrap an existing UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The bare UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// The `layer:///conversations/<uuid>` form.
    pub fn url(&self) -> String {
        format!("{LAYER_URL_PREFIX}conversations/{}", self.0)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_layer_id("conversation", "conversations", s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// MessageId
// ---------------------------------------------------------------------------

/// Identifier of a message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Wrap an existing UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The bare UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// The `layer:///messages/<uuid>` form.
    pub fn url(&self) -> String {
        format!("{LAYER_URL_PREFIX}messages/{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_layer_id("message", "messages", s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// DedupeId
// ---------------------------------------------------------------------------

/// Client-chosen UUID that lets the platform drop duplicate sends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupeId(Uuid);

impl DedupeId {
    /// Generate a fresh random dedupe id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DedupeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DedupeId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ModelError::InvalidIdentifier {
                kind: "dedupe",
                value: s.to_string(),
            })
    }
}
