//! Webhook HTTP Endpoint
//!
//! Routes:
//! - `POST /webhook/{token}`: Telegram update delivery
//! - `GET /`, `GET /healthz`: liveness probes for the hosting platform
//!
//! A request moves Received -> TokenChecked -> Dispatched -> Replied. A token
//! mismatch ends it at 403 before the body is looked at.

use crate::dispatcher::{Dispatcher, IncomingMessage};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// Subset of a Telegram `Update` the bot reads. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<UpdateMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMessage {
    pub chat: UpdateChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateChat {
    pub id: i64,
}

impl TelegramUpdate {
    /// The chat message carried by this update, if any
    pub fn into_message(self) -> Option<IncomingMessage> {
        self.message.map(|m| IncomingMessage {
            chat_id: m.chat.id,
            text: m.text,
        })
    }
}

/// JSON body of every webhook response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookReply {
    fn ok() -> Self {
        Self { ok: true, error: None }
    }

    fn rejected() -> Self {
        Self {
            ok: false,
            error: Some("invalid token".to_string()),
        }
    }
}

/// How a delivery ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Path token did not match
    Rejected,
    /// Body was not a decodable update
    Undecodable,
    /// Update carried no message
    Ignored,
    /// Message handled: reply delivered, or the command was for another bot
    Replied,
    /// Reply could not be delivered
    ReplyFailed,
}

impl WebhookOutcome {
    fn status(self) -> StatusCode {
        match self {
            Self::Rejected => StatusCode::FORBIDDEN,
            _ => StatusCode::OK,
        }
    }
}

/// State shared by webhook handlers
#[derive(Clone)]
pub struct WebhookState {
    secret: Arc<str>,
    dispatcher: Arc<Dispatcher>,
}

impl WebhookState {
    pub fn new(secret: &str, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            secret: Arc::from(secret),
            dispatcher,
        }
    }

    /// Run one delivery through token check, decode and dispatch
    pub async fn process(&self, token: &str, body: &[u8]) -> WebhookOutcome {
        if token != &*self.secret {
            warn!("Webhook call with invalid token");
            return WebhookOutcome::Rejected;
        }

        let update: TelegramUpdate = match serde_json::from_slice(body) {
            Ok(u) => u,
            Err(e) => {
                warn!("Undecodable webhook body: {}", e);
                return WebhookOutcome::Undecodable;
            }
        };

        let update_id = update.update_id;
        let Some(message) = update.into_message() else {
            debug!("Update {} has no message, ignoring", update_id);
            return WebhookOutcome::Ignored;
        };

        match self.dispatcher.handle(message).await {
            Ok(()) => WebhookOutcome::Replied,
            Err(e) => {
                error!("Failed to reply to update {}: {}", update_id, e);
                WebhookOutcome::ReplyFailed
            }
        }
    }
}

/// Build the HTTP router
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/healthz", get(liveness))
        .route("/webhook/{token}", post(receive_update))
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn liveness() -> &'static str {
    "ok"
}

async fn receive_update(
    State(state): State<WebhookState>,
    Path(token): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<WebhookReply>) {
    let outcome = state.process(&token, &body).await;
    let reply = match outcome {
        WebhookOutcome::Rejected => WebhookReply::rejected(),
        _ => WebhookReply::ok(),
    };
    (outcome.status(), Json(reply))
}
