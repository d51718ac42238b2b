//! Relay Flow Integration Tests
//!
//! Drives the dispatcher end to end against a mock upstream API and a
//! recording chat transport.

use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use visitbot::channels::{ParseMode, RecordedCall};
use visitbot::{BotVariant, Dispatcher, IncomingMessage, RecordingTransport, UpstreamClient};

const CHAT: i64 = 777;

struct TestEnvironment {
    server: MockServer,
    transport: Arc<RecordingTransport>,
    dispatcher: Dispatcher,
}

impl TestEnvironment {
    fn new(variant: BotVariant) -> Self {
        Self::with_transport(variant, RecordingTransport::new())
    }

    fn with_transport(variant: BotVariant, transport: RecordingTransport) -> Self {
        let server = MockServer::start();
        let transport = Arc::new(transport);
        let upstream = UpstreamClient::new(&format!("{}/bd/", server.base_url()), Duration::from_secs(5))
            .expect("upstream client");
        let dispatcher = Dispatcher::new(transport.clone(), upstream, variant);
        Self {
            server,
            transport,
            dispatcher,
        }
    }

    async fn send(&self, text: &str) -> String {
        self.dispatcher
            .handle(IncomingMessage::new(CHAT, text))
            .await
            .expect("reply delivered");
        let replies = self.transport.replies();
        assert_eq!(replies.len(), 1, "exactly one reply per message");
        assert_eq!(replies[0].chat_id, CHAT);
        replies[0].content.clone()
    }
}

mod commands {
    use super::*;

    #[tokio::test]
    async fn test_visit_renders_present_fields_only() {
        let env = TestEnvironment::new(BotVariant::Classic);
        let mock = env.server.mock(|when, then| {
            when.method(GET).path("/bd/654754678");
            then.status(200).json_body(json!({"uid": "654754678", "level": 42}));
        });

        let reply = env.send("/visit 654754678").await;

        mock.assert();
        assert!(reply.contains("• <b>Uid</b>: 654754678"));
        assert!(reply.contains("• <b>Level</b>: 42"));
        for absent in ["Region", "Rank", "Guild", "Nickname", "Other"] {
            assert!(!reply.contains(absent), "unexpected {absent} line");
        }
        assert_eq!(env.transport.replies()[0].parse_mode, ParseMode::Html);
    }

    #[tokio::test]
    async fn test_typing_indicator_precedes_reply() {
        let env = TestEnvironment::new(BotVariant::Classic);
        env.server.mock(|when, then| {
            when.method(GET).path("/bd/12345");
            then.status(200).json_body(json!({"uid": "12345"}));
        });

        env.send("/visit 12345").await;

        let calls = env.transport.calls();
        assert_eq!(calls[0], RecordedCall::Typing(CHAT));
        assert!(matches!(calls[1], RecordedCall::Send(_)));
    }

    #[tokio::test]
    async fn test_typing_failure_does_not_abort_lookup() {
        let env = TestEnvironment::with_transport(BotVariant::Classic, RecordingTransport::new().fail_typing());
        let mock = env.server.mock(|when, then| {
            when.method(GET).path("/bd/12345");
            then.status(200).json_body(json!({"uid": "12345"}));
        });

        let reply = env.send("/visit 12345").await;
        mock.assert();
        assert!(reply.contains("<b>Uid</b>: 12345"));
    }

    #[tokio::test]
    async fn test_upstream_500_shows_status_and_body() {
        let env = TestEnvironment::new(BotVariant::Classic);
        env.server.mock(|when, then| {
            when.method(GET).path("/bd/12345");
            then.status(500).body("server error");
        });

        let reply = env.send("/visit 12345").await;
        assert_eq!(reply, "❌ API error 500: server error");
        assert_eq!(env.transport.replies()[0].parse_mode, ParseMode::Plain);
    }

    #[tokio::test]
    async fn test_invalid_uid_names_length_range() {
        let env = TestEnvironment::new(BotVariant::Classic);
        let mock = env.server.mock(|when, then| {
            when.method(GET);
            then.status(200);
        });

        let reply = env.send("/visit 12ab").await;
        assert_eq!(reply, "UID must be 5–15 digits. Example: 654754678");
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn test_visit_without_uid() {
        let env = TestEnvironment::new(BotVariant::Classic);
        let reply = env.send("/visit").await;
        assert_eq!(reply, "Please provide a UID. Example: /visit 654754678");
    }
}

mod bare_text {
    use super::*;

    #[tokio::test]
    async fn test_bare_uid_equals_visit_command() {
        let by_command = TestEnvironment::new(BotVariant::Classic);
        let bare = TestEnvironment::new(BotVariant::Classic);
        for env in [&by_command, &bare] {
            env.server.mock(|when, then| {
                when.method(GET).path("/bd/123456789");
                then.status(200).json_body(json!({"uid": "123456789", "region": "BD"}));
            });
        }

        let a = by_command.send("/visit 123456789").await;
        let b = bare.send("123456789").await;
        assert_eq!(a, b);
        assert_eq!(by_command.transport.calls(), bare.transport.calls());
    }

    #[tokio::test]
    async fn test_hello_world_gets_help() {
        let env = TestEnvironment::new(BotVariant::Classic);
        let reply = env.send("hello world").await;
        assert!(reply.contains("Use: /visit <uid>"));
        assert!(reply.contains("Example: /visit 654754678"));
    }

    #[tokio::test]
    async fn test_summary_variant_extracts_embedded_uid() {
        let env = TestEnvironment::new(BotVariant::Summary);
        let mock = env.server.mock(|when, then| {
            when.method(GET).path("/bd/987654321");
            then.status(200).json_body(json!({
                "uid": "987654321",
                "name": "Ace<3",
                "likes": 120,
                "success": 100,
                "failed": 0
            }));
        });

        let reply = env.send("send visits to 987654321 pls").await;
        mock.assert();
        assert!(reply.starts_with("✅ <b>Visit Request Successful</b>"));
        assert!(reply.contains("<b>Name</b>: Ace&lt;3"));
        assert!(reply.contains("<b>Region</b>: N/A"));
        assert!(reply.contains("<b>Failed</b>: 0"));
    }
}

mod truncation {
    use super::*;

    #[tokio::test]
    async fn test_large_object_catch_all_is_bounded() {
        let env = TestEnvironment::new(BotVariant::Classic);
        env.server.mock(|when, then| {
            when.method(GET).path("/bd/12345");
            then.status(200).json_body(json!({"uid": "12345", "blob": "z".repeat(5000)}));
        });

        let reply = env.send("/visit 12345").await;
        let block = reply
            .rsplit("<code>")
            .next()
            .and_then(|s| s.strip_suffix("</code>"))
            .expect("catch-all block");
        let raw = block.replace("&quot;", "\"");
        assert_eq!(raw.chars().count(), 801);
        assert!(raw.starts_with("{\"blob\":\"zzz"));
        assert!(raw.ends_with('…'));
    }

    #[tokio::test]
    async fn test_large_scalar_is_bounded() {
        let env = TestEnvironment::new(BotVariant::Classic);
        env.server.mock(|when, then| {
            when.method(GET).path("/bd/12345");
            then.status(200).json_body(json!("y".repeat(5000)));
        });

        let reply = env.send("/visit 12345").await;
        assert_eq!(reply, format!("<code>{}…</code>", "y".repeat(1000)));
    }
}

mod delivery {
    use super::*;
    use visitbot::dispatcher::RENDER_FAILED_REPLY;

    #[tokio::test]
    async fn test_long_nickname_fits_one_message() {
        let env = TestEnvironment::new(BotVariant::Classic);
        env.server.mock(|when, then| {
            when.method(GET).path("/bd/12345");
            then.status(200)
                .json_body(json!({"uid": "12345", "nickname": "x".repeat(5000)}));
        });

        let reply = env.send("/visit 12345").await;
        assert!(reply.chars().count() <= 4096, "{} chars", reply.chars().count());
        assert!(reply.contains("<b>Nickname</b>: xxx"));
    }

    #[tokio::test]
    async fn test_rejected_html_falls_back_to_plain_text() {
        let env = TestEnvironment::with_transport(BotVariant::Classic, RecordingTransport::new().fail_html());
        env.server.mock(|when, then| {
            when.method(GET).path("/bd/12345");
            then.status(200).json_body(json!({"uid": "12345"}));
        });

        env.dispatcher
            .handle(IncomingMessage::new(CHAT, "/visit 12345"))
            .await
            .expect("fallback delivered");

        let replies = env.transport.replies();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].parse_mode, ParseMode::Html);
        assert_eq!(replies[1].parse_mode, ParseMode::Plain);
        assert_eq!(replies[1].content, RENDER_FAILED_REPLY);
        assert_eq!(replies[1].chat_id, CHAT);
    }

    #[tokio::test]
    async fn test_plain_replies_are_not_retried() {
        let env = TestEnvironment::with_transport(BotVariant::Classic, RecordingTransport::new().fail_html());
        let reply = env.send("/start").await;
        assert!(reply.contains("/visit <uid>"));
    }

    #[tokio::test]
    async fn test_command_for_other_bot_gets_no_reply() {
        let server = MockServer::start();
        let transport = Arc::new(RecordingTransport::new());
        let upstream = UpstreamClient::new(&server.base_url(), Duration::from_secs(5)).expect("upstream client");
        let dispatcher = Dispatcher::new(transport.clone(), upstream, BotVariant::Classic)
            .with_bot_username(Some("visit_bot".into()));
        let mock = server.mock(|when, then| {
            when.method(GET);
            then.status(200);
        });

        dispatcher
            .handle(IncomingMessage::new(CHAT, "/visit@someone_else_bot 12345"))
            .await
            .expect("nothing to deliver");

        assert!(transport.calls().is_empty());
        assert_eq!(mock.hits(), 0);
    }
}
