//! Visitbot
//!
//! Telegram webhook bot that relays Free Fire profile UIDs to a lookup API
//! and renders the JSON reply as chat text.
//!
//! # Architecture
//!
//! ```text
//! Telegram ──► POST /webhook/{token} ──► Dispatcher ──► Upstream API
//!                  (axum)                    │              │
//!                                            │         JSON value
//!                                            ▼              │
//!                                   ChatTransport ◄── Formatter (HTML)
//!                                     (teloxide)
//!
//! LifecycleManager: setWebhook on start, keep-alive ping loop, ordered shutdown
//! ```

pub mod channels;
pub mod config;
pub mod dispatcher;
pub mod format;
pub mod identifier;
pub mod keepalive;
pub mod lifecycle;
pub mod server;
pub mod upstream;
pub mod webhook;

pub use channels::{ChannelError, ChannelResponse, ChatTransport, RecordingTransport, TelegramTransport};
pub use config::{BotVariant, Config, ConfigError};
pub use dispatcher::{Action, Dispatcher, IncomingMessage};
pub use format::{format_response, ResponseStyle};
pub use identifier::{Identifier, IdentifierError};
pub use keepalive::KeepAlive;
pub use lifecycle::{LifecycleConfig, LifecycleManager, Registration, State as LifecycleState};
pub use server::BotServer;
pub use upstream::{FetchError, UpstreamClient};
pub use webhook::{TelegramUpdate, WebhookOutcome, WebhookState};
