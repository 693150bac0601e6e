//! In-memory provider state shared by all handlers.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use jsonwebtoken::DecodingKey;
use layer_models::{
    ConversationId, ConversationRef, Message, MessageBody, MessageId, ReceiptType, Sender,
    SenderInfo, UnreadBadge,
};
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::MockConfig;

/// Capacity of the websocket fan-out channel.
const PUSH_CAPACITY: usize = 256;

/// A message together with the bookkeeping the provider needs.
#[derive(Debug, Clone)]
struct StoredMessage {
    conversation: Uuid,
    dedupe: Option<String>,
    message: Message,
}

/// State shared across all Axum handlers.
pub struct ProviderState {
    /// Accepted application id.
    pub app_id: String,
    /// Accepted Platform API bearer token.
    pub platform_token: String,
    /// Key identity tokens are verified with.
    pub decoding_key: DecodingKey,
    /// Nonces handed out and not yet redeemed.
    nonces: Mutex<HashSet<String>>,
    /// Session token → user id.
    sessions: Mutex<HashMap<String, String>>,
    /// Messages in send order.
    messages: Mutex<Vec<StoredMessage>>,
    /// Change packets pushed to every open websocket.
    push: broadcast::Sender<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProviderState {
    /// Build the state from the configuration; fails on an unreadable key.
    pub fn new(config: &MockConfig) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key_pem.as_bytes())?;
        let (push, _) = broadcast::channel(PUSH_CAPACITY);
        Ok(Self {
            app_id: config.app_id.clone(),
            platform_token: config.platform_token.clone(),
            decoding_key,
            nonces: Mutex::new(HashSet::new()),
            sessions: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
            push,
        })
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Hand out a fresh nonce.
    pub fn issue_nonce(&self) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        lock(&self.nonces).insert(nonce.clone());
        nonce
    }

    /// Consume `nonce`; `false` if it was never issued or already used.
    pub fn redeem_nonce(&self, nonce: &str) -> bool {
        lock(&self.nonces).remove(nonce)
    }

    /// Open a session for `user_id` and return its token.
    pub fn open_session(&self, user_id: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        lock(&self.sessions).insert(token.clone(), user_id.to_string());
        token
    }

    /// User behind a session token.
    pub fn session_user(&self, token: &str) -> Option<String> {
        lock(&self.sessions).get(token).cloned()
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Store a message and push a change packet to websockets.
    ///
    /// Returns `None` when `dedupe` matches an already stored message.
    pub fn store_message(
        &self,
        conversation: ConversationId,
        body: MessageBody,
        dedupe: Option<String>,
    ) -> Option<Message> {
        let mut messages = lock(&self.messages);
        if dedupe.is_some() && messages.iter().any(|m| m.dedupe == dedupe) {
            return None;
        }

        let id = MessageId::new(Uuid::new_v4());
        let sender = match body.sender {
            Sender::UserId(user_id) => SenderInfo {
                user_id: Some(user_id),
                name: None,
            },
            Sender::Name(name) => SenderInfo {
                user_id: None,
                name: Some(name),
            },
        };
        let mut recipient_status = HashMap::new();
        if let Some(user_id) = &sender.user_id {
            recipient_status.insert(user_id.clone(), ReceiptType::Read.to_string());
        }

        let message = Message {
            id: id.url(),
            url: None,
            conversation: Some(ConversationRef {
                id: conversation.url(),
                url: None,
            }),
            parts: body.parts,
            sent_at: Some(Utc::now()),
            sender,
            is_unread: false,
            recipient_status,
        };

        messages.push(StoredMessage {
            conversation: conversation.uuid(),
            dedupe,
            message: message.clone(),
        });
        drop(messages);

        let packet = json!({
            "type": "change",
            "body": {
                "operation": "create",
                "object": { "type": "Message", "id": message.id },
                "data": message,
            }
        });
        // No subscribers is not an error.
        let _ = self.push.send(packet.to_string());

        Some(message)
    }

    /// Messages of a conversation, newest first, as seen by `viewer`.
    pub fn list_messages(
        &self,
        conversation: ConversationId,
        viewer: Option<&str>,
        page_size: Option<usize>,
        from_id: Option<MessageId>,
    ) -> Vec<Message> {
        let messages = lock(&self.messages);
        let newest_first = messages
            .iter()
            .rev()
            .filter(|m| m.conversation == conversation.uuid());

        let older: Vec<&StoredMessage> = match from_id {
            Some(from) => newest_first
                .skip_while(|m| m.message.id != from.url())
                .skip(1)
                .collect(),
            None => newest_first.collect(),
        };

        older
            .into_iter()
            .take(page_size.unwrap_or(usize::MAX))
            .map(|m| view(&m.message, viewer))
            .collect()
    }

    /// A single message as seen by `viewer`.
    pub fn find_message(&self, id: MessageId, viewer: &str) -> Option<Message> {
        lock(&self.messages)
            .iter()
            .find(|m| m.message.id == id.url())
            .map(|m| view(&m.message, Some(viewer)))
    }

    /// Record a receipt of `user_id`; `false` if the message is unknown.
    pub fn record_receipt(&self, id: MessageId, user_id: &str, receipt: ReceiptType) -> bool {
        let mut messages = lock(&self.messages);
        let Some(stored) = messages.iter_mut().find(|m| m.message.id == id.url()) else {
            return false;
        };

        let status = match receipt {
            ReceiptType::Read => "read",
            ReceiptType::Delivery => "delivered",
        };
        let entry = stored
            .message
            .recipient_status
            .entry(user_id.to_string())
            .or_insert_with(|| status.to_string());
        // A read message never drops back to delivered.
        if entry.as_str() != "read" {
            *entry = status.to_string();
        }
        true
    }

    /// Unread counters of `user_id` over every stored message.
    pub fn unread_badge(&self, user_id: &str) -> UnreadBadge {
        let messages = lock(&self.messages);
        let mut conversations = HashSet::new();
        let mut badge = UnreadBadge::default();

        for stored in messages.iter().filter(|m| is_unread(&m.message, user_id)) {
            if stored.message.sender.user_id.is_some() {
                badge.unread_message_count += 1;
                conversations.insert(stored.conversation);
            } else {
                badge.unread_announcement_count += 1;
            }
        }
        badge.unread_conversation_count = conversations.len() as u64;
        badge
    }

    // ------------------------------------------------------------------
    // Websocket fan-out
    // ------------------------------------------------------------------

    /// Receiver of change packets for a new websocket.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.push.subscribe()
    }
}

fn is_unread(message: &Message, user_id: &str) -> bool {
    message.sender.user_id.as_deref() != Some(user_id)
        && message.recipient_status.get(user_id).map(String::as_str) != Some("read")
}

fn view(message: &Message, viewer: Option<&str>) -> Message {
    let mut message = message.clone();
    message.is_unread = viewer.is_some_and(|user| is_unread(&message, user));
    message
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn state() -> ProviderState {
        let config = MockConfig {
            listen_port: 0,
            app_id: "app-1".into(),
            public_key_pem: crate::test_keys::keys().public_pem.clone(),
            platform_token: "platform-secret".into(),
        };
        ProviderState::new(&config).unwrap()
    }

    fn conversation() -> ConversationId {
        ConversationId::new(Uuid::new_v4())
    }

    #[test]
    fn nonces_are_single_use() {
        let state = state();
        let nonce = state.issue_nonce();
        assert!(state.redeem_nonce(&nonce));
        assert!(!state.redeem_nonce(&nonce));
        assert!(!state.redeem_nonce("never-issued"));
    }

    #[test]
    fn sessions_map_to_users() {
        let state = state();
        let token = state.open_session("alice");
        assert_eq!(state.session_user(&token).as_deref(), Some("alice"));
        assert!(state.session_user("bogus").is_none());
    }

    #[test]
    fn dedupe_rejects_second_send() {
        let state = state();
        let cid = conversation();
        let body = MessageBody::text_from_user("alice", "hi").unwrap();

        assert!(state.store_message(cid, body.clone(), Some("d-1".into())).is_some());
        assert!(state.store_message(cid, body.clone(), Some("d-1".into())).is_none());
        assert!(state.store_message(cid, body, None).is_some());
    }

    #[test]
    fn listing_pages_newest_first() {
        let state = state();
        let cid = conversation();
        let ids: Vec<String> = (0..3)
            .map(|i| {
                let body = MessageBody::text_from_user("alice", &format!("m{i}")).unwrap();
                state.store_message(cid, body, None).unwrap().id
            })
            .collect();

        let page = state.list_messages(cid, None, Some(2), None);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, ids[2]);

        let from: MessageId = ids[1].parse().unwrap();
        let older = state.list_messages(cid, None, None, Some(from));
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].id, ids[0]);
    }

    #[test]
    fn receipts_drive_badge() {
        let state = state();
        let cid = conversation();
        let body = MessageBody::text_from_user("alice", "hi").unwrap();
        let id: MessageId = state.store_message(cid, body, None).unwrap().id.parse().unwrap();
        let bot = MessageBody::text_from_name("Bot", "ping").unwrap();
        state.store_message(cid, bot, None);

        let badge = state.unread_badge("bob");
        assert_eq!(badge.unread_message_count, 1);
        assert_eq!(badge.unread_conversation_count, 1);
        assert_eq!(badge.unread_announcement_count, 1);
        // Own messages never count.
        assert_eq!(state.unread_badge("alice").unread_message_count, 0);

        assert!(state.record_receipt(id, "bob", ReceiptType::Delivery));
        assert!(state.find_message(id, "bob").unwrap().is_unread);
        assert!(state.record_receipt(id, "bob", ReceiptType::Read));
        assert!(state.record_receipt(id, "bob", ReceiptType::Delivery));
        assert!(!state.find_message(id, "bob").unwrap().is_unread);
        assert_eq!(state.unread_badge("bob").unread_message_count, 0);
    }

    #[test]
    fn receipt_for_unknown_message() {
        let state = state();
        assert!(!state.record_receipt(MessageId::new(Uuid::new_v4()), "bob", ReceiptType::Read));
    }

    #[tokio::test]
    async fn stored_messages_are_pushed() {
        let state = state();
        let mut rx = state.subscribe();
        let body = MessageBody::text_from_user("alice", "hi").unwrap();
        let message = state.store_message(conversation(), body, None).unwrap();

        let packet: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(packet["type"], "change");
        assert_eq!(packet["body"]["object"]["id"], message.id);
    }
}
