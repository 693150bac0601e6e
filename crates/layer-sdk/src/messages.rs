//! Message operations.
//!
//! Sending and listing go through the Platform API; receipts are posted on
//! behalf of a user through the Client API, authorized with that user's
//! session token from the [`SessionNegotiator`].

use std::sync::Arc;

use layer_models::{
    ConversationId, DedupeId, Message, MessageBody, MessageId, MessageQuery, ReceiptRequest,
    ReceiptType,
};
use reqwest::Url;
use tracing::debug;

use crate::config::LayerConfig;
use crate::error::SdkError;
use crate::headers;
use crate::platform::PlatformApi;
use crate::provider::{join, success_or_api_error};
use crate::session::SessionNegotiator;

/// Message endpoints of a client.
#[derive(Clone)]
pub struct MessagesResource {
    platform: PlatformApi,
    session: Arc<SessionNegotiator>,
    http: reqwest::Client,
    api_url: Url,
    api_version: String,
}

impl MessagesResource {
    pub(crate) fn new(
        http: reqwest::Client,
        config: &LayerConfig,
        platform: PlatformApi,
        session: Arc<SessionNegotiator>,
    ) -> Result<Self, SdkError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| SdkError::Config(format!("invalid api_url {}: {e}", config.api_url)))?;
        Ok(Self {
            platform,
            session,
            http,
            api_url,
            api_version: config.api_version.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Send `body` to a conversation.
    pub async fn send(&self, conversation: &str, body: &MessageBody) -> Result<Message, SdkError> {
        self.post_message(None, conversation, body).await
    }

    /// Send `body`, letting the platform drop it if `dedupe` was already used.
    pub async fn send_dedupe(
        &self,
        dedupe: &str,
        conversation: &str,
        body: &MessageBody,
    ) -> Result<Message, SdkError> {
        let dedupe: DedupeId = dedupe.parse()?;
        self.post_message(Some(dedupe), conversation, body).await
    }

    /// Send a plain-text message from a user.
    pub async fn send_text_from_user(
        &self,
        conversation: &str,
        user_id: &str,
        text: &str,
    ) -> Result<Message, SdkError> {
        let body = MessageBody::text_from_user(user_id, text)?;
        self.send(conversation, &body).await
    }

    /// Send a plain-text message under a system name.
    pub async fn send_text_from_name(
        &self,
        conversation: &str,
        name: &str,
        text: &str,
    ) -> Result<Message, SdkError> {
        let body = MessageBody::text_from_name(name, text)?;
        self.send(conversation, &body).await
    }

    async fn post_message(
        &self,
        dedupe: Option<DedupeId>,
        conversation: &str,
        body: &MessageBody,
    ) -> Result<Message, SdkError> {
        let conversation: ConversationId = conversation.parse()?;
        debug!(%conversation, "sending message");
        let conversation = conversation.to_string();
        let dedupe = dedupe.map(|d| d.to_string());
        self.platform
            .post(
                &["conversations", conversation.as_str(), "messages"],
                body,
                dedupe.as_deref(),
            )
            .await
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Messages of a conversation.
    pub async fn list(
        &self,
        conversation: &str,
        query: &MessageQuery,
    ) -> Result<Vec<Message>, SdkError> {
        let conversation = conversation.parse::<ConversationId>()?.to_string();
        self.platform
            .get(
                &["conversations", conversation.as_str(), "messages"],
                &query.to_pairs(),
            )
            .await
    }

    /// Messages of a conversation as seen by `user_id` (with per-user unread state).
    pub async fn list_from_user(
        &self,
        user_id: &str,
        conversation: &str,
        query: &MessageQuery,
    ) -> Result<Vec<Message>, SdkError> {
        require_user(user_id)?;
        let conversation = conversation.parse::<ConversationId>()?.to_string();
        self.platform
            .get(
                &["users", user_id, "conversations", conversation.as_str(), "messages"],
                &query.to_pairs(),
            )
            .await
    }

    /// One message as seen by `user_id`.
    pub async fn get_from_user(&self, user_id: &str, message: &str) -> Result<Message, SdkError> {
        require_user(user_id)?;
        let message = message.parse::<MessageId>()?.to_string();
        self.platform
            .get(&["users", user_id, "messages", message.as_str()], &[])
            .await
    }

    // ------------------------------------------------------------------
    // Receipts
    // ------------------------------------------------------------------

    /// Mark a message as read by `user_id`.
    pub async fn set_read(&self, user_id: &str, message: &str) -> Result<(), SdkError> {
        self.post_receipt(user_id, message, ReceiptType::Read).await
    }

    /// Mark a message as delivered to `user_id`.
    pub async fn set_delivered(&self, user_id: &str, message: &str) -> Result<(), SdkError> {
        self.post_receipt(user_id, message, ReceiptType::Delivery)
            .await
    }

    async fn post_receipt(
        &self,
        user_id: &str,
        message: &str,
        receipt_type: ReceiptType,
    ) -> Result<(), SdkError> {
        let message = message.parse::<MessageId>()?.to_string();
        let token = self.session.session_token(user_id).await?;

        debug!(%message, %receipt_type, "posting receipt");
        let url = join(&self.api_url, ["messages", message.as_str(), "receipts"])?;
        let res = self
            .http
            .post(url)
            .headers(headers::session(&self.api_version, &token)?)
            .json(&ReceiptRequest { receipt_type })
            .send()
            .await?;
        success_or_api_error(res).await?;
        Ok(())
    }
}

fn require_user(user_id: &str) -> Result<(), SdkError> {
    if user_id.trim().is_empty() {
        return Err(SdkError::Validation("user id isn't defined".into()));
    }
    Ok(())
}
