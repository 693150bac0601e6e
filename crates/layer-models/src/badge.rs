//! Unread counters returned by `GET /apps/{app}/users/{user}/badge`.

use serde::{Deserialize, Serialize};

/// Per-user unread counts.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadBadge {
    /// Number of conversations holding at least one unread message.
    #[serde(default)]
    pub unread_conversation_count: u64,
    /// Total number of unread messages.
    #[serde(default)]
    pub unread_message_count: u64,
    /// Number of unread announcements.
    #[serde(default)]
    pub unread_announcement_count: u64,
}
