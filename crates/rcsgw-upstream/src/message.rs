//! Outbound message sends.
//!
//! All send operations funnel through one of two wire dialects: the
//! Google-RBM-style JSON API (`contentMessage` bodies, `messageId` as a query
//! parameter) or the GSMA-style wrapped-content API (the same logical body
//! JSON-stringified inside an envelope). The caller-configured dialect decides
//! which one is used; the body shaping itself is pure and unit-tested.
//!
//! No automatic retry: RCS delivery is confirmed asynchronously via webhook,
//! so request-level retries risk double-sending.

use std::sync::Arc;
use std::time::Duration;

use rcsgw_core::config::{Dialect, UpstreamConfig};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, UpstreamError};
use crate::token::TokenProvider;

/// Logical content of an outbound message. Exactly one variant per message.
#[derive(Debug, Clone)]
pub enum MessageContent {
    Text(String),
    /// Caller-shaped rich card value, passed through as `richCard`.
    RichCard(Value),
    /// Caller-shaped carousel card list, wrapped as `richCard.carouselCard`.
    Carousel(Value),
    /// Raw payload used verbatim as the content message.
    Custom(Value),
}

/// What the caller gets back from a successful send: the generated message
/// identifier (for out-of-band webhook correlation) and the raw upstream body.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
    pub body: Value,
}

/// Map logical content to a Google-style `contentMessage` value.
pub fn content_message(content: &MessageContent) -> Value {
    match content {
        MessageContent::Text(text) => json!({ "text": text }),
        MessageContent::RichCard(card) => json!({ "richCard": card }),
        MessageContent::Carousel(cards) => json!({ "richCard": { "carouselCard": cards } }),
        MessageContent::Custom(payload) => payload.clone(),
    }
}

/// Wrap a Google-style body in the GSMA envelope: the logical content rides
/// JSON-stringified in `content`, addressing moves to envelope fields.
pub fn gsma_envelope(bot_id: &str, msisdn: &str, message_id: &str, body: &Value) -> Value {
    json!({
        "destinationAddress": [msisdn],
        "senderAddress": bot_id,
        "messageId": message_id,
        "messageContentType": "application/json",
        "contentEncoding": "utf8",
        "content": body.to_string(),
    })
}

pub struct MessageGateway {
    http: reqwest::Client,
    server_root: String,
    bot_id: String,
    dialect: Dialect,
    tokens: Arc<TokenProvider>,
}

impl MessageGateway {
    pub fn new(cfg: &UpstreamConfig, tokens: Arc<TokenProvider>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.request_timeout_secs))
                .build()
                .expect("failed to build message http client"),
            server_root: cfg.server_root.clone(),
            bot_id: cfg.bot_id.clone(),
            dialect: cfg.dialect,
            tokens,
        }
    }

    pub async fn send_text(&self, msisdn: &str, text: &str) -> Result<SendReceipt> {
        self.send(msisdn, &MessageContent::Text(text.to_string()))
            .await
    }

    pub async fn send_rich_card(&self, msisdn: &str, card: Value) -> Result<SendReceipt> {
        self.send(msisdn, &MessageContent::RichCard(card)).await
    }

    pub async fn send_custom(&self, msisdn: &str, payload: Value) -> Result<SendReceipt> {
        self.send(msisdn, &MessageContent::Custom(payload)).await
    }

    /// Send via the configured dialect.
    pub async fn send(&self, msisdn: &str, content: &MessageContent) -> Result<SendReceipt> {
        match self.dialect {
            Dialect::Google => self.send_google(msisdn, content).await,
            Dialect::Gsma => self.send_gsma(msisdn, content).await,
        }
    }

    /// Google-style send: `POST {root}/phones/{msisdn}/agentMessages?messageId={uuid}`.
    ///
    /// The message id is generated fresh per attempt and passed as a query
    /// parameter for upstream deduplication.
    pub async fn send_google(&self, msisdn: &str, content: &MessageContent) -> Result<SendReceipt> {
        let message_id = Uuid::new_v4().to_string();
        let token = self.tokens.get_access_token().await?;
        let url = format!("{}/phones/{msisdn}/agentMessages", self.server_root);
        let body = json!({ "contentMessage": content_message(content) });

        debug!(msisdn, message_id = %message_id, "sending google-style message");
        let resp = self
            .http
            .post(&url)
            .query(&[("messageId", message_id.as_str())])
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        self.finish(resp, message_id, msisdn).await
    }

    /// GSMA-style send: `POST {root}/messaging/v1/bots/{bot_id}/messages`.
    pub async fn send_gsma(&self, msisdn: &str, content: &MessageContent) -> Result<SendReceipt> {
        let message_id = Uuid::new_v4().to_string();
        let token = self.tokens.get_access_token().await?;
        let url = format!("{}/messaging/v1/bots/{}/messages", self.server_root, self.bot_id);
        let body = json!({ "contentMessage": content_message(content) });
        let envelope = gsma_envelope(&self.bot_id, msisdn, &message_id, &body);

        debug!(msisdn, message_id = %message_id, "sending gsma-style message");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&envelope)
            .send()
            .await?;

        self.finish(resp, message_id, msisdn).await
    }

    /// Surface the upstream response verbatim: 2xx returns the body, anything
    /// else is logged with full upstream detail and propagated unchanged.
    async fn finish(
        &self,
        resp: reqwest::Response,
        message_id: String,
        msisdn: &str,
    ) -> Result<SendReceipt> {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, msisdn, "upstream rejected message");
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(SendReceipt { message_id, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[test]
    fn text_maps_to_content_message_text() {
        let body = content_message(&MessageContent::Text("hello".into()));
        assert_eq!(body, json!({"text": "hello"}));
    }

    #[test]
    fn rich_card_rides_under_rich_card_key() {
        let card = json!({"standaloneCard": {"cardContent": {"title": "Offer"}}});
        let body = content_message(&MessageContent::RichCard(card.clone()));
        assert_eq!(body, json!({"richCard": card}));
    }

    #[test]
    fn carousel_wraps_as_carousel_card() {
        let cards = json!([{"title": "a"}, {"title": "b"}]);
        let body = content_message(&MessageContent::Carousel(cards.clone()));
        assert_eq!(body, json!({"richCard": {"carouselCard": cards}}));
    }

    #[test]
    fn custom_payload_is_verbatim() {
        let payload = json!({"text": "x", "suggestions": [{"reply": {"text": "Yes"}}]});
        assert_eq!(content_message(&MessageContent::Custom(payload.clone())), payload);
    }

    #[test]
    fn gsma_content_round_trips_to_original_body() {
        let body = json!({"contentMessage": {"text": "hello"}});
        let envelope = gsma_envelope("bot-1", "+15551234567", "mid-1", &body);

        assert_eq!(envelope["destinationAddress"], json!(["+15551234567"]));
        assert_eq!(envelope["senderAddress"], "bot-1");
        assert_eq!(envelope["messageId"], "mid-1");
        assert_eq!(envelope["contentEncoding"], "utf8");

        let content: Value =
            serde_json::from_str(envelope["content"].as_str().unwrap()).unwrap();
        assert_eq!(content, body);
    }

    #[derive(Clone, Default)]
    struct Recorded {
        sends: Arc<Mutex<Vec<(String, Option<String>, Option<String>, Value)>>>,
    }

    /// Mock upstream exposing the auth endpoint and the Google-style send
    /// route, recording (msisdn, messageId, bearer, body) per call.
    async fn spawn_upstream(recorded: Recorded) -> String {
        let sends = Arc::clone(&recorded.sends);
        let app = Router::new()
            .route(
                "/oauth/token",
                post(|| async {
                    Json(json!({"access_token": "mock-token", "expires_in": 3600}))
                }),
            )
            .route(
                "/phones/{msisdn}/agentMessages",
                post(
                    move |Path(msisdn): Path<String>,
                          Query(params): Query<HashMap<String, String>>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
                        let sends = Arc::clone(&sends);
                        async move {
                            let bearer = headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            sends.lock().unwrap().push((
                                msisdn,
                                params.get("messageId").cloned(),
                                bearer,
                                body,
                            ));
                            Json(json!({"name": "phones/x/agentMessages/ok"}))
                        }
                    },
                ),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gateway(base: &str) -> MessageGateway {
        let cfg = UpstreamConfig {
            auth_url: format!("{base}/oauth/token"),
            server_root: base.to_string(),
            client_id: "client".into(),
            client_secret: "secret".into(),
            bot_id: "bot-1".into(),
            ..UpstreamConfig::default()
        };
        let tokens = Arc::new(TokenProvider::new(&cfg));
        MessageGateway::new(&cfg, tokens)
    }

    #[tokio::test]
    async fn identical_sends_get_distinct_message_ids() {
        let recorded = Recorded::default();
        let base = spawn_upstream(recorded.clone()).await;
        let gw = gateway(&base);

        let first = gw.send_text("+15551234567", "hi").await.unwrap();
        let second = gw.send_text("+15551234567", "hi").await.unwrap();
        assert_ne!(first.message_id, second.message_id);

        let sends = recorded.sends.lock().unwrap();
        assert_eq!(sends.len(), 2);
        // The wire messageId matches the receipt, and both parse as UUIDs.
        for (receipt, (_, wire_id, _, _)) in [&first, &second].iter().zip(sends.iter()) {
            assert_eq!(wire_id.as_deref(), Some(receipt.message_id.as_str()));
            Uuid::parse_str(&receipt.message_id).unwrap();
        }
    }

    #[tokio::test]
    async fn google_send_carries_bearer_and_content_message() {
        let recorded = Recorded::default();
        let base = spawn_upstream(recorded.clone()).await;
        let gw = gateway(&base);

        let receipt = gw.send_text("+15557654321", "Your OTP is 4821").await.unwrap();
        assert_eq!(receipt.body["name"], "phones/x/agentMessages/ok");

        let sends = recorded.sends.lock().unwrap();
        let (msisdn, _, bearer, body) = &sends[0];
        assert_eq!(msisdn, "+15557654321");
        assert_eq!(bearer.as_deref(), Some("Bearer mock-token"));
        assert_eq!(body["contentMessage"]["text"], "Your OTP is 4821");
    }

    #[tokio::test]
    async fn gsma_send_posts_envelope_with_bearer() {
        let sends: Arc<Mutex<Vec<(Option<String>, Value)>>> = Arc::default();
        let captured = Arc::clone(&sends);

        let app = Router::new()
            .route(
                "/oauth/token",
                post(|| async {
                    Json(json!({"access_token": "mock-token", "expires_in": 3600}))
                }),
            )
            .route(
                "/messaging/v1/bots/bot-1/messages",
                post(move |headers: HeaderMap, Json(body): Json<Value>| {
                    let captured = Arc::clone(&captured);
                    async move {
                        let bearer = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        captured.lock().unwrap().push((bearer, body));
                        Json(json!({"status": "accepted"}))
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base = format!("http://{addr}");
        let cfg = UpstreamConfig {
            auth_url: format!("{base}/oauth/token"),
            server_root: base,
            client_id: "client".into(),
            client_secret: "secret".into(),
            bot_id: "bot-1".into(),
            dialect: Dialect::Gsma,
            ..UpstreamConfig::default()
        };
        let tokens = Arc::new(TokenProvider::new(&cfg));
        let gw = MessageGateway::new(&cfg, tokens);

        let receipt = gw.send_text("+15551234567", "hello").await.unwrap();
        assert_eq!(receipt.body["status"], "accepted");

        let sends = sends.lock().unwrap();
        let (bearer, envelope) = &sends[0];
        assert_eq!(bearer.as_deref(), Some("Bearer mock-token"));
        assert_eq!(envelope["destinationAddress"], json!(["+15551234567"]));
        assert_eq!(envelope["senderAddress"], "bot-1");
        assert_eq!(envelope["messageId"], receipt.message_id.as_str());
        assert_eq!(envelope["contentEncoding"], "utf8");
        let content: Value =
            serde_json::from_str(envelope["content"].as_str().unwrap()).unwrap();
        assert_eq!(content["contentMessage"]["text"], "hello");
    }

    #[tokio::test]
    async fn upstream_rejection_propagates_status_and_body() {
        let app = Router::new()
            .route(
                "/oauth/token",
                post(|| async { Json(json!({"access_token": "t", "expires_in": 3600})) }),
            )
            .route(
                "/phones/{msisdn}/agentMessages",
                post(|| async {
                    (
                        axum::http::StatusCode::BAD_REQUEST,
                        Json(json!({"error": "invalid msisdn"})),
                    )
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let gw = gateway(&format!("http://{addr}"));
        let err = gw.send_text("bad", "x").await.unwrap_err();
        match err {
            UpstreamError::Api { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid msisdn"));
            }
            other => panic!("expected Api error, got {other}"),
        }
    }
}
