//! Webhook event dispatch seam.
//!
//! The gateway classifies inbound callbacks and hands them to a
//! `WebhookHandler` in a detached task — the HTTP 200 acknowledgement never
//! waits on the handler, and handler failures cannot reach the response path.
//! Business logic plugs in here.

use async_trait::async_trait;
use rcsgw_core::webhook::{WebhookEvent, WebhookKind};
use serde_json::Value;
use tracing::info;

#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle(&self, event: WebhookEvent) -> anyhow::Result<()>;
}

/// Default handler: logs each event by kind. Stands in for downstream
/// business logic until a real consumer is wired up.
pub struct LogHandler;

#[async_trait]
impl WebhookHandler for LogHandler {
    async fn handle(&self, event: WebhookEvent) -> anyhow::Result<()> {
        let sender = event.sender.as_deref().unwrap_or("-");
        match event.kind {
            WebhookKind::UserMessage => {
                let text = event
                    .payload
                    .pointer("/contentMessage/text")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                info!(sender, text, "inbound user message");
            }
            WebhookKind::SuggestionResponse => {
                let postback = event
                    .payload
                    .pointer("/suggestionResponse/postbackData")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                info!(sender, postback, "suggestion response");
            }
            WebhookKind::StatusUpdate => {
                let status = event
                    .payload
                    .get("eventType")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                info!(
                    message_id = event.message_id.as_deref().unwrap_or("-"),
                    status,
                    "delivery status update"
                );
            }
            WebhookKind::FileAttachment => {
                info!(sender, "inbound file attachment");
            }
            WebhookKind::Unknown => {
                info!(sender, payload = %event.payload, "unrecognized webhook shape");
            }
        }
        Ok(())
    }
}
