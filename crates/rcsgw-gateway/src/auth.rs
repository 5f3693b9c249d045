//! Internal auth for /api/* routes.
//!
//! The webhook intake route is NOT behind this middleware — it is
//! authenticated by the upstream platform's signature instead.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;

/// Reject requests without an Authorization header with 401. When an
/// `api_token` is configured the header must be exactly `Bearer <token>`;
/// when unconfigured any present header passes (warned at startup).
pub async fn require_internal_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let authorized = match (header, state.config.gateway.api_token.as_deref()) {
        (None, _) => false,
        (Some(value), Some(expected)) => value
            .strip_prefix("Bearer ")
            .map(|token| token == expected)
            .unwrap_or(false),
        (Some(_), None) => true,
    };

    if !authorized {
        warn!(path = %request.uri().path(), "rejected request with missing or invalid internal auth");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized"})),
        )
            .into_response();
    }

    next.run(request).await
}
