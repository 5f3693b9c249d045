//! Template and media management against the upstream platform.
//!
//! Templates are created/listed/deleted on the bot-scoped directory endpoint;
//! there is no update — delete + recreate is the update path, and the upstream
//! platform stays the system of record (nothing is cached locally).
//!
//! Media follows a two-step protocol: upload the file first, then reference
//! the returned identifier/URL inside the template spec. Template creation is
//! never an atomic multipart-with-binary call.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rcsgw_core::config::UpstreamConfig;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{Result, UpstreamError};
use crate::token::TokenProvider;

pub struct TemplateRegistry {
    http: reqwest::Client,
    server_root: String,
    bot_id: String,
    tokens: Arc<TokenProvider>,
}

impl TemplateRegistry {
    pub fn new(cfg: &UpstreamConfig, tokens: Arc<TokenProvider>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.request_timeout_secs))
                .build()
                .expect("failed to build template http client"),
            server_root: cfg.server_root.clone(),
            bot_id: cfg.bot_id.clone(),
            tokens,
        }
    }

    fn templates_url(&self) -> String {
        format!(
            "{}/directory/secure/api/v1/bots/{}/templates",
            self.server_root, self.bot_id
        )
    }

    /// Create a template. The spec is trusted as provided — the carousel /
    /// standAlone shape invariant is enforced by the API layer before this
    /// call. The spec rides JSON-encoded in the `rich_template_data` form
    /// field per the upstream contract.
    pub async fn create_template(&self, spec: Value) -> Result<Value> {
        let token = self.tokens.get_access_token().await?;
        let form = reqwest::multipart::Form::new().text("rich_template_data", spec.to_string());

        debug!(name = spec.get("name").and_then(|v| v.as_str()).unwrap_or("-"), "creating template");
        let resp = self
            .http
            .post(self.templates_url())
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await?;

        self.read_body(resp, "template create").await
    }

    pub async fn list_templates(&self) -> Result<Value> {
        let token = self.tokens.get_access_token().await?;
        let resp = self
            .http
            .get(self.templates_url())
            .bearer_auth(&token)
            .send()
            .await?;

        self.read_body(resp, "template list").await
    }

    /// Delete a template by its upstream id. Returns the upstream body, or a
    /// `{"deleted": id}` marker when upstream responds with an empty body.
    pub async fn delete_template(&self, id: &str) -> Result<Value> {
        let token = self.tokens.get_access_token().await?;
        let url = format!("{}/{id}", self.templates_url());
        let resp = self.http.delete(&url).bearer_auth(&token).send().await?;

        let body = self.read_body(resp, "template delete").await?;
        if body.is_null() {
            return Ok(json!({ "deleted": id }));
        }
        Ok(body)
    }

    /// Upload a local media file; returns the upstream-assigned identifier.
    ///
    /// The upstream names the asset either `name` or `fileId` depending on
    /// deployment — both are accepted, `name` preferred.
    pub async fn upload_file(&self, path: &Path, mime: &str) -> Result<String> {
        let token = self.tokens.get_access_token().await?;
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| UpstreamError::Parse(format!("invalid mime type {mime:?}: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/rcs/upload/v1/files", self.server_root);
        let resp = self
            .http
            .post(&url)
            .query(&[("botId", self.bot_id.as_str())])
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await?;

        let body = self.read_body(resp, "media upload").await?;
        body.get("name")
            .or_else(|| body.get("fileId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                UpstreamError::Parse(format!("upload response has neither name nor fileId: {body}"))
            })
    }

    /// Propagate upstream errors verbatim; parse 2xx bodies as JSON with a
    /// string fallback, and empty bodies as null.
    async fn read_body(&self, resp: reqwest::Response, op: &str) -> Result<Value> {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, "upstream {op} failed");
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
