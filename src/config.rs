//! Configuration management
//!
//! Everything is read once at startup and never mutated afterwards.

use crate::format::ResponseStyle;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://yunus-bhai-visit-ff.onrender.com/bd";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 300;

/// Fatal configuration problems
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing TELEGRAM_BOT_TOKEN env var")]
    MissingToken,

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which bot flavor to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotVariant {
    /// Exact-UID bare messages, generic field list
    #[default]
    Classic,
    /// UID found anywhere in bare text, fixed summary rendering
    Summary,
}

impl BotVariant {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "classic" | "" => Some(Self::Classic),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }

    /// Bare text may contain the UID anywhere
    pub fn accepts_embedded_uid(&self) -> bool {
        matches!(self, Self::Summary)
    }

    pub fn response_style(&self) -> ResponseStyle {
        match self {
            Self::Classic => ResponseStyle::Generic,
            Self::Summary => ResponseStyle::Summary,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token; also the webhook path secret
    pub bot_token: String,

    /// Upstream lookup base URL
    pub api_base: String,

    /// Externally reachable base URL (webhook registration)
    pub public_url: Option<String>,

    /// Keep-alive ping target (None disables the task)
    pub keepalive_url: Option<String>,

    pub keepalive_interval: Duration,

    pub upstream_timeout: Duration,

    pub variant: BotVariant,

    /// Bot username without `@`; commands addressed to other bots are skipped
    pub bot_username: Option<String>,

    /// HTTP listen address
    pub bind_addr: IpAddr,
    pub port: u16,

    /// Custom Bot API server
    pub telegram_api_url: Option<String>,

    /// Call deleteWebhook on shutdown
    pub delete_webhook_on_shutdown: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::MissingToken)?;

        let api_base = get("API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let public_url = get("RENDER_EXTERNAL_URL").or_else(|| get("PUBLIC_URL"));

        let keepalive_url = get("KEEPALIVE_URL").or_else(|| public_url.clone());

        let keepalive_interval = Duration::from_secs(parse_or(
            "KEEPALIVE_INTERVAL_SECS",
            get("KEEPALIVE_INTERVAL_SECS"),
            DEFAULT_KEEPALIVE_INTERVAL_SECS,
        )?);

        let upstream_timeout = Duration::from_secs(parse_or(
            "UPSTREAM_TIMEOUT_SECS",
            get("UPSTREAM_TIMEOUT_SECS"),
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?);

        let variant = match get("BOT_VARIANT") {
            None => BotVariant::default(),
            Some(v) => BotVariant::parse(&v).ok_or(ConfigError::Invalid {
                name: "BOT_VARIANT",
                value: v,
            })?,
        };

        let bot_username = get("BOT_USERNAME").map(|v| v.trim_start_matches('@').to_string());

        let bind_addr = parse_or("HOST", get("HOST"), IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;

        let telegram_api_url = get("TELEGRAM_API_URL");

        let delete_webhook_on_shutdown = get("DELETE_WEBHOOK_ON_SHUTDOWN")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            bot_token,
            api_base,
            public_url,
            keepalive_url,
            keepalive_interval,
            upstream_timeout,
            variant,
            bot_username,
            bind_addr,
            port,
            telegram_api_url,
            delete_webhook_on_shutdown,
        })
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// `<public_url>/webhook/<token>`, if a public URL is known
    pub fn webhook_url(&self) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{}/webhook/{}", base.trim_end_matches('/'), self.bot_token))
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}
