pub mod app;
pub mod auth;
pub mod dispatch;
pub mod http;

pub use app::{build_router, AppState};
pub use dispatch::{LogHandler, WebhookHandler};
