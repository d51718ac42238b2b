//! Telegram Transport
//!
//! Wraps `teloxide::Bot` for outbound calls. Inbound updates arrive through
//! the webhook router, not teloxide's dispatcher.

use super::traits::{ChannelError, ChannelResponse, ChatTransport, ParseMode};
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, LinkPreviewOptions};
use tracing::{debug, info};

/// Timeout for webhook registration calls
pub const WEBHOOK_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram Bot API transport
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Create a transport for `token`, optionally against a custom Bot API server
    pub fn new(token: &str, api_url: Option<&str>) -> Result<Self, ChannelError> {
        let mut bot = Bot::new(token);
        if let Some(url) = api_url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| ChannelError::InvalidUrl(format!("{}: {}", url, e)))?;
            bot = bot.set_api_url(parsed);
        }
        Ok(Self { bot })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, response: ChannelResponse) -> Result<(), ChannelError> {
        let mut request = self
            .bot
            .send_message(ChatId(response.chat_id), response.content);

        if response.parse_mode == ParseMode::Html {
            request = request.parse_mode(teloxide::types::ParseMode::Html);
        }
        if response.disable_preview {
            request = request.link_preview_options(LinkPreviewOptions {
                is_disabled: true,
                url: None,
                prefer_small_media: false,
                prefer_large_media: false,
                show_above_text: false,
            });
        }

        request
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;
        debug!("Sent reply to chat {}", response.chat_id);
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), ChannelError> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> Result<(), ChannelError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ChannelError::InvalidUrl(format!("{}: {}", url, e)))?;
        tokio::time::timeout(WEBHOOK_CALL_TIMEOUT, self.bot.set_webhook(parsed).into_future())
            .await
            .map_err(|_| ChannelError::WebhookFailed("setWebhook timed out".into()))?
            .map_err(|e| ChannelError::WebhookFailed(e.to_string()))?;
        info!("Telegram webhook registered");
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<(), ChannelError> {
        tokio::time::timeout(WEBHOOK_CALL_TIMEOUT, self.bot.delete_webhook().into_future())
            .await
            .map_err(|_| ChannelError::WebhookFailed("deleteWebhook timed out".into()))?
            .map_err(|e| ChannelError::WebhookFailed(e.to_string()))?;
        info!("Telegram webhook deleted");
        Ok(())
    }
}
