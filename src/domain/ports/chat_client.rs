use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::domain::models::{Message, RawUpdate};
use crate::domain::ports::errors::ChatClientError;

/// Parameters of a single long-poll request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatesRequest {
    /// First update id to return (`cursor + 1`), omitted when no cursor is set
    pub offset: Option<i64>,
    /// How long the server may hold the request open
    pub poll_timeout: Duration,
    /// Client-side deadline, longer than `poll_timeout`
    pub request_timeout: Duration,
}

/// Options for an outgoing text message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageOptions {
    pub parse_mode: Option<String>,
    pub reply_to_message_id: Option<i64>,
    pub disable_web_page_preview: bool,
    pub reply_markup: Option<Value>,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            parse_mode: Some("HTML".to_string()),
            reply_to_message_id: None,
            disable_web_page_preview: false,
            reply_markup: None,
        }
    }
}

impl MessageOptions {
    #[must_use]
    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    #[must_use]
    pub fn without_preview(mut self) -> Self {
        self.disable_web_page_preview = true;
        self
    }
}

/// Entry of the command list advertised to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Chat-platform API port.
///
/// Implementations must be safe to share between concurrently running
/// handlers.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Long-poll for new updates
    async fn get_updates(&self, request: UpdatesRequest)
        -> Result<Vec<RawUpdate>, ChatClientError>;

    /// Post a message to a chat
    async fn post_message(
        &self,
        chat_id: i64,
        text: &str,
        options: MessageOptions,
    ) -> Result<(), ChatClientError>;

    /// Reply to `message` in its chat
    async fn reply(
        &self,
        message: &Message,
        text: &str,
        options: MessageOptions,
    ) -> Result<(), ChatClientError> {
        tracing::debug!(chat_id = message.chat.id, "replying to message");
        self.post_message(message.chat.id, text, options.reply_to(message.message_id))
            .await
    }

    /// Replace the advertised command list
    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), ChatClientError>;

    /// Acknowledge a callback query
    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChatClientError>;
}
