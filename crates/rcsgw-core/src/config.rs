use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8085;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30; // upstream calls must never hang unbounded

/// Top-level config (rcsgw.toml + RCSGW_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RcsConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// The HTTP surface this service exposes to internal callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Internal bearer for /api/* routes. When unset, any Authorization
    /// header is accepted (presence-only check) and startup warns.
    pub api_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            api_token: None,
        }
    }
}

/// Connection settings for the upstream RCS platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// OAuth2 client-credentials token endpoint.
    #[serde(default)]
    pub auth_url: String,
    /// Base URL for all platform API calls (send, templates, upload).
    #[serde(default)]
    pub server_root: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// The platform's identifier for our registered messaging agent.
    #[serde(default)]
    pub bot_id: String,
    /// Which wire dialect the configured upstream deployment speaks.
    /// Not auto-negotiated — operator integrations differ.
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            auth_url: String::new(),
            server_root: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            bot_id: String::new(),
            dialect: Dialect::default(),
            request_timeout_secs: default_timeout(),
        }
    }
}

/// Wire dialect for outbound sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Google-RBM-style JSON API (`contentMessage` bodies).
    #[default]
    Google,
    /// GSMA-style wrapped-content API (stringified `content` envelope).
    Gsma,
}

/// Inbound webhook verification settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookConfig {
    /// Shared HMAC-SHA256 secret. When unset, signature verification is
    /// skipped — an explicit opt-out, warned at startup.
    pub secret: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl RcsConfig {
    /// Load config from a TOML file with RCSGW_* env var overrides
    /// (double underscore separates nesting: RCSGW_UPSTREAM__CLIENT_ID).
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("rcsgw.toml");

        let config: RcsConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RCSGW_").split("__"))
            .extract()
            .map_err(|e| crate::error::RcsError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Soft validation: names of required upstream credential fields that are
    /// missing. Callers log these as warnings — startup is never blocked.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.upstream.client_id.is_empty() {
            missing.push("upstream.client_id");
        }
        if self.upstream.client_secret.is_empty() {
            missing.push("upstream.client_secret");
        }
        if self.upstream.bot_id.is_empty() {
            missing.push("upstream.bot_id");
        }
        missing
    }
}
