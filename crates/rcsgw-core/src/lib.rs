pub mod config;
pub mod error;
pub mod webhook;

pub use config::{Dialect, RcsConfig};
pub use error::RcsError;
pub use webhook::{classify, WebhookEvent, WebhookKind};
