//! Chat Channels
//!
//! Outbound chat abstraction:
//! - Telegram (teloxide Bot API client)
//! - Recording (in-memory, for tests)
//!
//! The dispatcher and lifecycle hold an `Arc<dyn ChatTransport>`.

pub mod recording;
pub mod telegram;
pub mod traits;

pub use recording::{RecordedCall, RecordingTransport};
pub use telegram::TelegramTransport;
pub use traits::{ChannelError, ChannelResponse, ChatTransport, ParseMode};
