//! Command Dispatcher
//!
//! Turns one inbound chat message into exactly one outbound reply:
//! help, a usage error, or the rendered upstream lookup.

use crate::channels::{ChannelError, ChannelResponse, ChatTransport, ParseMode};
use crate::config::BotVariant;
use crate::format::format_response;
use crate::identifier::{Identifier, IdentifierError};
use crate::upstream::UpstreamClient;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// UID used in help and usage messages
pub const EXAMPLE_UID: &str = "654754678";

/// Sent in plain text when the provider rejects a formatted reply
pub const RENDER_FAILED_REPLY: &str = "❌ Could not display the API response";

/// Text of an inbound message, already pulled out of the update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub text: Option<String>,
}

impl IncomingMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: Some(text.into()),
        }
    }
}

/// What to do with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Help,
    /// Command addressed to a different bot (`/visit@other_bot`)
    NotForUs,
    /// `/visit` without an argument
    MissingUid,
    /// `/visit` with something that isn't 5-15 digits
    InvalidUid,
    Visit(Identifier),
}

/// Classify a message's text.
///
/// With `bot_username` set, commands carrying an `@suffix` for another bot
/// are [`Action::NotForUs`]. Without it any suffix is accepted.
pub fn classify(text: Option<&str>, variant: BotVariant, bot_username: Option<&str>) -> Action {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Action::Help;
    };

    if let Some(rest) = text.strip_prefix('/') {
        let mut parts = rest.split_whitespace();
        let head = parts.next().unwrap_or("");
        // "/visit@my_bot" addresses a specific bot in group chats
        let (command, addressee) = match head.split_once('@') {
            Some((command, addressee)) => (command, Some(addressee)),
            None => (head, None),
        };
        if let (Some(addressee), Some(ours)) = (addressee, bot_username) {
            if !addressee.eq_ignore_ascii_case(ours.trim_start_matches('@')) {
                return Action::NotForUs;
            }
        }
        let command = command.to_lowercase();

        return match command.as_str() {
            "visit" => match parts.next().map(Identifier::parse) {
                None | Some(Err(IdentifierError::Missing)) => Action::MissingUid,
                Some(Err(IdentifierError::Malformed)) => Action::InvalidUid,
                Some(Ok(uid)) => Action::Visit(uid),
            },
            _ => Action::Help,
        };
    }

    if let Ok(uid) = Identifier::parse(text) {
        return Action::Visit(uid);
    }
    if variant.accepts_embedded_uid() {
        if let Some(uid) = Identifier::find_embedded(text) {
            return Action::Visit(uid);
        }
    }
    Action::Help
}

/// Static help message
pub fn help_text(api_base: &str) -> String {
    format!(
        "👋 Assalamu Alaikum!\n\n\
        Use: /visit <uid> (Free Fire ID)\n\
        Example: /visit {EXAMPLE_UID}\n\n\
        Endpoint: {}/<uid>",
        api_base.trim_end_matches('/')
    )
}

/// Performs the action for each inbound message
pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
    upstream: UpstreamClient,
    variant: BotVariant,
    bot_username: Option<String>,
    help: String,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn ChatTransport>, upstream: UpstreamClient, variant: BotVariant) -> Self {
        let help = help_text(upstream.base_url());
        Self {
            transport,
            upstream,
            variant,
            bot_username: None,
            help,
        }
    }

    /// Only answer `/command@suffix` when the suffix names this bot
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Handle one message. Only a failure to deliver the reply is an error.
    pub async fn handle(&self, msg: IncomingMessage) -> Result<(), ChannelError> {
        let action = classify(msg.text.as_deref(), self.variant, self.bot_username.as_deref());
        debug!("Chat {} -> {:?}", msg.chat_id, action);

        let reply = match action {
            Action::NotForUs => return Ok(()),
            Action::Help => ChannelResponse::text(msg.chat_id, self.help.clone()),
            Action::MissingUid => ChannelResponse::text(
                msg.chat_id,
                format!("Please provide a UID. Example: /visit {EXAMPLE_UID}"),
            ),
            Action::InvalidUid => ChannelResponse::text(
                msg.chat_id,
                format!("{}. Example: {EXAMPLE_UID}", IdentifierError::Malformed),
            ),
            Action::Visit(uid) => self.visit(msg.chat_id, &uid).await,
        };

        if reply.parse_mode != ParseMode::Html {
            return self.transport.send(reply).await;
        }
        let chat_id = reply.chat_id;
        match self.transport.send(reply).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Formatted reply to chat {} rejected, sending plain fallback: {}", chat_id, e);
                self.transport
                    .send(ChannelResponse::text(chat_id, RENDER_FAILED_REPLY))
                    .await
            }
        }
    }

    async fn visit(&self, chat_id: i64, uid: &Identifier) -> ChannelResponse {
        if let Err(e) = self.transport.send_typing(chat_id).await {
            debug!("Typing indicator failed (ignored): {}", e);
        }

        match self.upstream.fetch(uid).await {
            Ok(value) => {
                info!("Lookup ok for uid {}", uid);
                ChannelResponse::html(chat_id, format_response(&value, self.variant.response_style()))
            }
            Err(e) => {
                warn!("Lookup failed for uid {}: {}", uid, e);
                ChannelResponse::text(chat_id, format!("❌ {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic(text: &str) -> Action {
        classify(Some(text), BotVariant::Classic, None)
    }

    fn summary(text: &str) -> Action {
        classify(Some(text), BotVariant::Summary, None)
    }

    fn as_bot(text: &str) -> Action {
        classify(Some(text), BotVariant::Classic, Some("visit_bot"))
    }

    fn visit(uid: &str) -> Action {
        Action::Visit(Identifier::parse(uid).unwrap())
    }

    #[test]
    fn test_start_and_help() {
        assert_eq!(classic("/start"), Action::Help);
        assert_eq!(classic("/help"), Action::Help);
        assert_eq!(classic("/HELP"), Action::Help);
    }

    #[test]
    fn test_unknown_command_falls_back_to_help() {
        assert_eq!(classic("/stats"), Action::Help);
        assert_eq!(classic("/"), Action::Help);
    }

    #[test]
    fn test_visit_variants() {
        assert_eq!(classic("/visit 654754678"), visit("654754678"));
        assert_eq!(classic("/visit@visit_bot 654754678"), visit("654754678"));
        assert_eq!(classic("/visit   12345   extra"), visit("12345"));
        assert_eq!(classic("/visit"), Action::MissingUid);
        assert_eq!(classic("/visit 1234"), Action::InvalidUid);
        assert_eq!(classic("/visit abcdef"), Action::InvalidUid);
    }

    #[test]
    fn test_bare_uid_is_implicit_visit() {
        assert_eq!(classic("123456789"), classic("/visit 123456789"));
        assert_eq!(classic("  123456789  "), visit("123456789"));
    }

    #[test]
    fn test_plain_text_falls_back_to_help() {
        assert_eq!(classic("hello world"), Action::Help);
        assert_eq!(classic("visit 123456789 please"), Action::Help);
        assert_eq!(classify(None, BotVariant::Classic, None), Action::Help);
        assert_eq!(classic("   "), Action::Help);
    }

    #[test]
    fn test_summary_variant_finds_embedded_uid() {
        assert_eq!(summary("visit 123456789 please"), visit("123456789"));
        assert_eq!(summary("hello world"), Action::Help);
        assert_eq!(summary("pin 1234"), Action::Help);
    }

    #[test]
    fn test_overlong_digit_run_is_not_split() {
        assert_eq!(summary("id 1234567890123456 pls"), Action::Help);
        assert_eq!(summary("id 1234567890123456 or 55555"), visit("55555"));
    }

    #[test]
    fn test_commands_for_other_bots_are_skipped() {
        assert_eq!(as_bot("/visit@someone_else_bot 12345"), Action::NotForUs);
        assert_eq!(as_bot("/start@someone_else_bot"), Action::NotForUs);
        assert_eq!(as_bot("/visit@Visit_Bot 12345"), visit("12345"));
        assert_eq!(as_bot("/visit 12345"), visit("12345"));
        assert_eq!(
            classify(Some("/visit@visit_bot 12345"), BotVariant::Classic, Some("@visit_bot")),
            visit("12345")
        );
    }

    #[test]
    fn test_help_text_mentions_usage_and_endpoint() {
        let help = help_text("https://api.example.com/bd/");
        assert!(help.contains("/visit <uid>"));
        assert!(help.contains("Example: /visit 654754678"));
        assert!(help.contains("Endpoint: https://api.example.com/bd/<uid>"));
    }
}
