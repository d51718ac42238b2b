//! Bot HTTP Server
//!
//! Wires config, transport, dispatcher and lifecycle together and serves the
//! webhook router until a shutdown signal arrives.

use crate::channels::{ChatTransport, TelegramTransport};
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::lifecycle::{LifecycleConfig, LifecycleManager};
use crate::upstream::UpstreamClient;
use crate::webhook::{router, WebhookState};
use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

/// Bot server
pub struct BotServer {
    config: Config,
    transport: Arc<dyn ChatTransport>,
    dispatcher: Arc<Dispatcher>,
}

impl BotServer {
    /// Build the server with a Telegram transport
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn ChatTransport> = Arc::new(
            TelegramTransport::new(&config.bot_token, config.telegram_api_url.as_deref())
                .context("Failed to create Telegram transport")?,
        );
        Self::with_transport(config, transport)
    }

    /// Build the server around any transport
    pub fn with_transport(config: Config, transport: Arc<dyn ChatTransport>) -> Result<Self> {
        let upstream = UpstreamClient::new(&config.api_base, config.upstream_timeout)
            .context("Failed to create upstream client")?;
        let dispatcher = Arc::new(
            Dispatcher::new(transport.clone(), upstream, config.variant)
                .with_bot_username(config.bot_username.clone()),
        );
        Ok(Self {
            config,
            transport,
            dispatcher,
        })
    }

    /// Build the router with all routes and middleware
    pub fn build_router(&self) -> Router {
        router(WebhookState::new(&self.config.bot_token, self.dispatcher.clone()))
    }

    /// Start the server and run until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Start the server and run until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        let lifecycle = LifecycleManager::new(LifecycleConfig::from(&self.config), self.transport.clone());
        lifecycle.start().await;

        info!("Listening on {} (variant: {:?})", addr, self.config.variant);
        let served = axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await;

        lifecycle.shutdown().await;

        if let Err(e) = &served {
            warn!("HTTP server exited with error: {}", e);
        }
        served.context("HTTP server failed")?;
        info!("Server shut down gracefully");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
