/// Errors produced by upstream RCS platform calls.
///
/// Deliberately thin: the gateway surfaces these as opaque 500s and callers
/// needing fine-grained handling inspect the raw status/body in `Api`.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("auth endpoint rejected request: {0}")]
    Auth(String),

    #[error("upstream API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected upstream response: {0}")]
    Parse(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
