//! Keep-Alive Task
//!
//! Pings a URL on a fixed interval so the hosting platform does not suspend
//! an idle process. Failures are logged and the loop carries on; only the
//! shutdown signal ends it, including mid-sleep.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Timeout for a single ping
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Periodic no-op GET against a configured URL
#[derive(Debug, Clone)]
pub struct KeepAlive {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl KeepAlive {
    pub fn new(url: &str, interval: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(PING_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            interval,
        })
    }

    /// One ping; any HTTP status counts as a response
    pub async fn ping(&self) -> Result<reqwest::StatusCode, reqwest::Error> {
        let response = self.client.get(&self.url).send().await?;
        Ok(response.status())
    }

    /// Ping every interval until `shutdown` flips to true or its sender is dropped.
    ///
    /// Returns the number of pings attempted.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!("Keep-alive started: {} every {:?}", self.url, self.interval);
        let mut attempts = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            attempts += 1;
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("Keep-alive ping abandoned on shutdown");
                    break;
                }
                result = self.ping() => match result {
                    Ok(status) => info!("Keep-alive ping {} -> {}", self.url, status),
                    Err(e) => warn!("Keep-alive ping {} failed: {}", self.url, e),
                },
            }
        }

        info!("Keep-alive stopped after {} pings", attempts);
        attempts
    }

    /// Run on the Tokio runtime
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<u64> {
        tokio::spawn(self.run(shutdown))
    }
}
