use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use rcsgw_gateway::{build_router, AppState, LogHandler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rcsgw_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: RCSGW_CONFIG path > ./rcsgw.toml, with RCSGW_* overrides
    let config_path = std::env::var("RCSGW_CONFIG").ok();
    let config = rcsgw_core::config::RcsConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        rcsgw_core::config::RcsConfig::default()
    });

    // Soft validation: missing credentials warn but never block startup.
    for field in config.validate() {
        warn!(field, "upstream credential missing — calls to the RCS platform will fail");
    }
    if config.webhook.secret.is_none() {
        warn!("no webhook secret configured — inbound webhook signatures will NOT be verified");
    }
    if config.gateway.api_token.is_none() {
        warn!("no api_token configured — any Authorization header is accepted on /api routes");
    }

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let state = Arc::new(AppState::new(config, Arc::new(LogHandler)));
    let router = build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("RCS gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
