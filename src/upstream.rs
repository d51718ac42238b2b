//! Upstream Profile API Client
//!
//! One GET per lookup against `<base>/<uid>`. No retries: every call is
//! attempted exactly once.

use crate::format::truncate_with_ellipsis;
use crate::identifier::Identifier;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest error-body preview shown to the user
pub const BODY_PREVIEW_CHARS: usize = 200;

/// Upstream lookup failure
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("API error {code}: {body_preview}")]
    UpstreamStatus { code: u16, body_preview: String },

    #[error("Failed to reach API: {message}")]
    Unreachable { message: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Unreachable {
            message: e.to_string(),
        }
    }
}

/// Client for the profile lookup endpoint
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// Create a client; `timeout` bounds the whole request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full lookup URL for a UID
    pub fn url_for(&self, uid: &Identifier) -> String {
        format!("{}/{}", self.base_url, uid)
    }

    /// Look up a UID and return the decoded JSON body verbatim.
    pub async fn fetch(&self, uid: &Identifier) -> Result<serde_json::Value, FetchError> {
        let url = self.url_for(uid);
        debug!("Upstream GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("Upstream returned {} for uid {}", status, uid);
            return Err(FetchError::UpstreamStatus {
                code: status.as_u16(),
                body_preview: truncate_with_ellipsis(&body, BODY_PREVIEW_CHARS),
            });
        }

        let value = response.json::<serde_json::Value>().await?;
        Ok(value)
    }
}
