//! Process Lifecycle Management
//!
//! Startup: register the webhook with the chat provider, then start the
//! keep-alive task. Shutdown releases in reverse: stop keep-alive, then
//! (optionally) deregister the webhook.
//!
//! A missing public URL is not fatal; the bot runs without a registered
//! webhook and logs a warning.

use crate::channels::ChatTransport;
use crate::config::Config;
use crate::keepalive::KeepAlive;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    /// Constructed, startup not finished
    Starting = 0,
    /// Startup done, serving requests
    Running = 1,
    /// Shutdown in progress
    Stopping = 2,
    /// All resources released
    Stopped = 3,
}

impl From<u8> for State {
    fn from(v: u8) -> Self {
        match v {
            0 => State::Starting,
            1 => State::Running,
            2 => State::Stopping,
            _ => State::Stopped,
        }
    }
}

/// Configuration for the lifecycle manager
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Full callback URL to register, `None` for degraded mode
    pub webhook_url: Option<String>,
    /// Keep-alive target, `None` disables the task
    pub keepalive_url: Option<String>,
    pub keepalive_interval: Duration,
    pub delete_webhook_on_shutdown: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            keepalive_url: None,
            keepalive_interval: Duration::from_secs(300), // 5 minutes
            delete_webhook_on_shutdown: false,
        }
    }
}

impl From<&Config> for LifecycleConfig {
    fn from(config: &Config) -> Self {
        Self {
            webhook_url: config.webhook_url(),
            keepalive_url: config.keepalive_url.clone(),
            keepalive_interval: config.keepalive_interval,
            delete_webhook_on_shutdown: config.delete_webhook_on_shutdown,
        }
    }
}

/// Result of the startup webhook registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered,
    Failed(String),
    /// No public URL configured
    Skipped,
}

/// Owns the webhook registration and the keep-alive task
pub struct LifecycleManager {
    state: AtomicU8,
    config: LifecycleConfig,
    transport: Arc<dyn ChatTransport>,
    shutdown_tx: watch::Sender<bool>,
    keepalive: Mutex<Option<JoinHandle<u64>>>,
    webhook_registered: AtomicBool,
}

impl LifecycleManager {
    pub fn new(config: LifecycleConfig, transport: Arc<dyn ChatTransport>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            state: AtomicU8::new(State::Starting as u8),
            config,
            transport,
            shutdown_tx,
            keepalive: Mutex::new(None),
            webhook_registered: AtomicBool::new(false),
        }
    }

    /// Get current state
    pub fn current_state(&self) -> State {
        State::from(self.state.load(Ordering::Relaxed))
    }

    /// Receiver that flips to `true` when shutdown begins
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Register the webhook and launch keep-alive
    pub async fn start(&self) -> Registration {
        let registration = self.register_webhook().await;

        if let Some(url) = &self.config.keepalive_url {
            match KeepAlive::new(url, self.config.keepalive_interval) {
                Ok(task) => {
                    let handle = task.spawn(self.shutdown_signal());
                    *self.lock_keepalive() = Some(handle);
                }
                Err(e) => warn!("Keep-alive disabled, client setup failed: {}", e),
            }
        } else {
            info!("No keep-alive URL configured");
        }

        // A shutdown that raced startup wins
        self.try_transition(State::Starting, State::Running);
        registration
    }

    async fn register_webhook(&self) -> Registration {
        let Some(url) = &self.config.webhook_url else {
            warn!("No public URL found; set PUBLIC_URL or RENDER_EXTERNAL_URL. Webhook not registered.");
            return Registration::Skipped;
        };

        match self.transport.set_webhook(url).await {
            Ok(()) => {
                self.webhook_registered.store(true, Ordering::Relaxed);
                info!("Webhook set to: {}", redact_token(url));
                Registration::Registered
            }
            Err(e) => {
                error!("Webhook registration on {} failed: {}", self.transport.name(), e);
                Registration::Failed(e.to_string())
            }
        }
    }

    /// Stop keep-alive, then deregister if configured. Safe to call twice.
    pub async fn shutdown(&self) {
        let claimed = self.try_transition(State::Running, State::Stopping)
            || self.try_transition(State::Starting, State::Stopping);
        if !claimed {
            return;
        }

        self.shutdown_tx.send_replace(true);
        let handle = self.lock_keepalive().take();
        if let Some(handle) = handle {
            match handle.await {
                Ok(pings) => debug!("Keep-alive joined after {} pings", pings),
                Err(e) => warn!("Keep-alive task ended abnormally: {}", e),
            }
        }

        if self.config.delete_webhook_on_shutdown && self.webhook_registered.load(Ordering::Relaxed) {
            if let Err(e) = self.transport.delete_webhook().await {
                warn!("Failed to delete webhook: {}", e);
            }
        }

        self.transition_to(State::Stopped);
        info!("Lifecycle stopped");
    }

    /// Move `from` -> `to` only if the state is still `from`
    fn try_transition(&self, from: State, to: State) -> bool {
        let moved = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if moved {
            debug!("Lifecycle: {:?} -> {:?}", from, to);
        }
        moved
    }

    fn transition_to(&self, new_state: State) {
        let old = self.state.swap(new_state as u8, Ordering::Relaxed);
        if old != new_state as u8 {
            debug!("Lifecycle: {:?} -> {:?}", State::from(old), new_state);
        }
    }

    fn lock_keepalive(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<u64>>> {
        self.keepalive.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Hide the bot token in a `/webhook/<token>` URL
pub fn redact_token(url: &str) -> String {
    match url.rfind("/webhook/") {
        Some(idx) => format!("{}/webhook/***", &url[..idx]),
        None => url.to_string(),
    }
}
