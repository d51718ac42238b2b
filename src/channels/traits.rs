//! Chat Transport Trait Definitions
//!
//! The seam between the dispatcher and the chat provider. The dispatcher and
//! lifecycle only ever see `dyn ChatTransport`.

use async_trait::async_trait;

/// Error types for transport operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Webhook registration failed: {0}")]
    WebhookFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse mode for message formatting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Sent verbatim
    #[default]
    Plain,
    /// Telegram HTML subset
    Html,
}

/// Reply to send back to a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelResponse {
    /// Target chat ID
    pub chat_id: i64,

    /// Response content
    pub content: String,

    pub parse_mode: ParseMode,

    /// Suppress link previews for URLs in the content
    pub disable_preview: bool,
}

impl ChannelResponse {
    pub fn text(chat_id: i64, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            content: content.into(),
            parse_mode: ParseMode::Plain,
            disable_preview: false,
        }
    }

    pub fn html(chat_id: i64, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            content: content.into(),
            parse_mode: ParseMode::Html,
            disable_preview: true,
        }
    }
}

/// Outbound side of the chat provider
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Channel name identifier
    fn name(&self) -> &str;

    /// Send a reply
    async fn send(&self, response: ChannelResponse) -> Result<(), ChannelError>;

    /// Send typing indicator
    async fn send_typing(&self, chat_id: i64) -> Result<(), ChannelError>;

    /// Point the provider's webhook at `url`
    async fn set_webhook(&self, url: &str) -> Result<(), ChannelError>;

    /// Remove the provider's webhook
    async fn delete_webhook(&self) -> Result<(), ChannelError>;
}
