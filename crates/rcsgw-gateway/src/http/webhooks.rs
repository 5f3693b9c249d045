//! Webhook intake — POST /api/webhooks/vi-rbm.
//!
//! Acknowledge first, process second: the 200 is computed as soon as
//! classification completes, and the handler runs in a detached task. The
//! upstream platform retries unacknowledged webhooks, and duplicate
//! processing is worse than a dropped side effect here.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use hmac::{Hmac, Mac};
use rcsgw_core::webhook::classify;
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the upstream's base64 HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-goog-signature";

pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Signature check only when a secret is configured; skipping without one
    // is an explicit opt-out, warned at startup.
    if let Some(secret) = state.config.webhook.secret.as_deref() {
        let header = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        if !verify_signature(secret, &body, header) {
            warn!("webhook signature verification failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid signature"})),
            )
                .into_response();
        }
    }

    // Malformed JSON still classifies (as unknown) and still acknowledges —
    // the shape mismatch won't resolve itself on an upstream retry.
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "webhook body is not valid JSON");
            json!({"raw": String::from_utf8_lossy(&body)})
        }
    };

    let event = classify(&payload);
    info!(
        kind = event.kind.as_str(),
        sender = event.sender.as_deref().unwrap_or("-"),
        message_id = event.message_id.as_deref().unwrap_or("-"),
        "webhook classified"
    );

    // Fire-and-forget dispatch: the already-computed 200 never waits on the
    // handler, and a handler failure is logged inside the task.
    let handler = Arc::clone(&state.handler);
    tokio::spawn(async move {
        let kind = event.kind;
        if let Err(e) = handler.handle(event).await {
            warn!(kind = kind.as_str(), error = %e, "webhook handler failed");
        }
    });

    Json(json!({"status": "ok"})).into_response()
}

/// Constant-time check of base64(HMAC-SHA256(secret, body)) against the
/// signature header. Missing or undecodable headers fail closed.
pub fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(header) = header else {
        return false;
    };
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
