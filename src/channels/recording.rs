//! In-memory transport that records every outbound call.
//!
//! Used by tests and for exercising the dispatcher without a live bot.

use super::traits::{ChannelError, ChannelResponse, ChatTransport, ParseMode};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Send(ChannelResponse),
    Typing(i64),
    SetWebhook(String),
    DeleteWebhook,
}

/// Transport that stores calls instead of performing them
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    fail_typing: AtomicBool,
    fail_html: AtomicBool,
    fail_webhook: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make typing indicators fail
    pub fn fail_typing(self) -> Self {
        self.fail_typing.store(true, Ordering::Relaxed);
        self
    }

    /// Make HTML-formatted sends fail, as Telegram does for oversized or malformed markup
    pub fn fail_html(self) -> Self {
        self.fail_html.store(true, Ordering::Relaxed);
        self
    }

    /// Make webhook registration fail
    pub fn fail_webhook(self) -> Self {
        self.fail_webhook.store(true, Ordering::Relaxed);
        self
    }

    /// Snapshot of all calls so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    /// Replies attempted so far, including rejected ones
    pub fn replies(&self) -> Vec<ChannelResponse> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Send(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RecordedCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, response: ChannelResponse) -> Result<(), ChannelError> {
        let html = response.parse_mode == ParseMode::Html;
        self.record(RecordedCall::Send(response));
        if html && self.fail_html.load(Ordering::Relaxed) {
            return Err(ChannelError::SendFailed("can't parse entities".into()));
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), ChannelError> {
        self.record(RecordedCall::Typing(chat_id));
        if self.fail_typing.load(Ordering::Relaxed) {
            return Err(ChannelError::SendFailed("typing disabled".into()));
        }
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> Result<(), ChannelError> {
        self.record(RecordedCall::SetWebhook(url.to_string()));
        if self.fail_webhook.load(Ordering::Relaxed) {
            return Err(ChannelError::WebhookFailed("rejected".into()));
        }
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<(), ChannelError> {
        self.record(RecordedCall::DeleteWebhook);
        Ok(())
    }
}
