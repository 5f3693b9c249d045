use axum::{
    routing::{delete, get, post},
    Router,
};
use rcsgw_core::config::RcsConfig;
use rcsgw_upstream::{MessageGateway, TemplateRegistry, TokenProvider};
use std::sync::Arc;

use crate::dispatch::WebhookHandler;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: RcsConfig,
    pub messages: MessageGateway,
    pub templates: TemplateRegistry,
    pub handler: Arc<dyn WebhookHandler>,
}

impl AppState {
    pub fn new(config: RcsConfig, handler: Arc<dyn WebhookHandler>) -> Self {
        // One TokenProvider instance shared by both upstream components —
        // the process-wide token cache lives here and nowhere else.
        let tokens = Arc::new(TokenProvider::new(&config.upstream));
        let messages = MessageGateway::new(&config.upstream, Arc::clone(&tokens));
        let templates = TemplateRegistry::new(&config.upstream, tokens);
        Self {
            config,
            messages,
            templates,
            handler,
        }
    }
}

/// Assemble the full Axum router. Every /api route except the webhook intake
/// sits behind the internal auth middleware; the webhook is authenticated by
/// its upstream signature instead.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/messages/text", post(crate::http::messages::send_text))
        .route(
            "/api/messages/rich-card",
            post(crate::http::messages::send_rich_card),
        )
        .route(
            "/api/messages/custom",
            post(crate::http::messages::send_custom),
        )
        .route(
            "/api/templates",
            post(crate::http::templates::create).get(crate::http::templates::list),
        )
        .route("/api/templates/{id}", delete(crate::http::templates::remove))
        .route("/api/templates/upload", post(crate::http::templates::upload))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            crate::auth::require_internal_auth,
        ));

    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/api/webhooks/vi-rbm",
            post(crate::http::webhooks::webhook_handler),
        )
        .merge(protected)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
