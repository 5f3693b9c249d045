//! OAuth2 client-credentials token provider for the upstream platform.
//!
//! Maintains a single cached `(token, expiry)` pair per process. The token is
//! fetched lazily, refreshed before expiry with a safety margin, and never
//! persisted outside process memory. A failed refresh leaves the cache
//! untouched so the next call retries cleanly — no local backoff loop.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rcsgw_core::config::UpstreamConfig;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, UpstreamError};

/// Refresh this long before the upstream-reported expiry. Covers clock skew
/// and network latency between "token checked" and "token used".
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Upstream default when `expires_in` is absent from the token response.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

struct CachedToken {
    token: String,
    /// Margin already subtracted: the token is usable while `now < expires_at`.
    expires_at: DateTime<Utc>,
}

pub struct TokenProvider {
    http: reqwest::Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(cfg: &UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.request_timeout_secs))
                .build()
                .expect("failed to build token http client"),
            auth_url: cfg.auth_url.clone(),
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            cached: RwLock::new(None),
        }
    }

    /// Return a valid bearer token, refreshing if the cached one has expired.
    ///
    /// Fast path takes a read lock only. The write-locked slow path re-checks
    /// before fetching, so concurrent callers coalesce into one refresh.
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if Utc::now() < entry.expires_at {
                    return Ok(entry.token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(entry) = cached.as_ref() {
            if Utc::now() < entry.expires_at {
                return Ok(entry.token.clone());
            }
        }

        info!("fetching new access token from upstream auth endpoint");
        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let resp = self
            .http
            .post(&self.auth_url)
            .query(&[("grant_type", "client_credentials")])
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "token endpoint rejected request");
            return Err(UpstreamError::Auth(format!(
                "status {}: {body}",
                status.as_u16()
            )));
        }

        let token_resp: TokenResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(format!("invalid token response: {e}")))?;

        let expires_in = token_resp.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        debug!(expires_in, "access token refreshed");

        Ok(CachedToken {
            token: token_resp.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in as i64 - EXPIRY_MARGIN_SECS),
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}
