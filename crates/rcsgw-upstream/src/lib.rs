//! Client for the upstream RCS platform: OAuth2 token lifecycle, outbound
//! message sends in both wire dialects, and template/media management.

pub mod error;
pub mod message;
pub mod template;
pub mod token;

pub use error::UpstreamError;
pub use message::{MessageContent, MessageGateway, SendReceipt};
pub use template::TemplateRegistry;
pub use token::TokenProvider;
