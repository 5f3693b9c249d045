pub mod health;
pub mod messages;
pub mod templates;
pub mod webhooks;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rcsgw_upstream::UpstreamError;
use serde_json::json;
use tracing::error;

/// Component failures surface as a generic 500 carrying the error message —
/// no structured taxonomy at this layer; callers inspect logs / raw upstream
/// detail when they need more.
pub(crate) fn upstream_error(err: UpstreamError) -> Response {
    error!(error = %err, "upstream call failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": err.to_string()})),
    )
        .into_response()
}

pub(crate) fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": message.into()})),
    )
        .into_response()
}

/// Server-side faults that are not the caller's doing (e.g. local staging
/// failures before the upstream call).
pub(crate) fn internal_error(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": message.into()})),
    )
        .into_response()
}
