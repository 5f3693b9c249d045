//! Outbound message routes. Validation here is required-field presence only;
//! content shaping and dialect selection live in the upstream client.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use rcsgw_upstream::SendReceipt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;
use crate::http::{bad_request, upstream_error};

#[derive(Deserialize)]
pub struct SendTextRequest {
    pub msisdn: String,
    pub text: String,
}

#[derive(Deserialize)]
pub struct SendRichCardRequest {
    pub msisdn: String,
    #[serde(rename = "cardData")]
    pub card_data: Value,
}

#[derive(Deserialize)]
pub struct SendCustomRequest {
    pub msisdn: String,
    pub payload: Value,
}

/// POST /api/messages/text
pub async fn send_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendTextRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return bad_request(e.body_text()),
    };
    match state.messages.send_text(&req.msisdn, &req.text).await {
        Ok(receipt) => receipt_response(receipt),
        Err(e) => upstream_error(e),
    }
}

/// POST /api/messages/rich-card
pub async fn send_rich_card(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendRichCardRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return bad_request(e.body_text()),
    };
    match state.messages.send_rich_card(&req.msisdn, req.card_data).await {
        Ok(receipt) => receipt_response(receipt),
        Err(e) => upstream_error(e),
    }
}

/// POST /api/messages/custom
pub async fn send_custom(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendCustomRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return bad_request(e.body_text()),
    };
    match state.messages.send_custom(&req.msisdn, req.payload).await {
        Ok(receipt) => receipt_response(receipt),
        Err(e) => upstream_error(e),
    }
}

/// The caller needs the generated message id to correlate the delivery
/// webhook later, plus the upstream's echoed body.
fn receipt_response(receipt: SendReceipt) -> Response {
    Json(json!({
        "messageId": receipt.message_id,
        "response": receipt.body,
    }))
    .into_response()
}
