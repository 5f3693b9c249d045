//! Template CRUD and media upload routes.
//!
//! Media is a two-step protocol: upload here first, then reference the
//! returned identifier inside the template spec passed to create.

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use crate::http::{bad_request, internal_error, upstream_error};

/// POST /api/templates — the template spec is passed through to the upstream
/// platform as provided; only its JSON-object shape is checked here.
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(spec) = match payload {
        Ok(p) => p,
        Err(e) => return bad_request(e.body_text()),
    };
    if !spec.is_object() {
        return bad_request("template spec must be a JSON object");
    }
    match state.templates.create_template(spec).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => upstream_error(e),
    }
}

/// GET /api/templates
pub async fn list(State(state): State<Arc<AppState>>) -> Response {
    match state.templates.list_templates().await {
        Ok(body) => Json(body).into_response(),
        Err(e) => upstream_error(e),
    }
}

/// DELETE /api/templates/{id}
pub async fn remove(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.templates.delete_template(&id).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => upstream_error(e),
    }
}

/// POST /api/templates/upload — multipart with a file field. The bytes land
/// in a transient temp file handed to the upstream uploader; nothing is
/// retained locally after the call.
pub async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                // Any field carrying a filename counts as the upload.
                if field.file_name().is_none() {
                    continue;
                }
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((mime, bytes.to_vec()));
                        break;
                    }
                    Err(e) => return bad_request(format!("failed to read file field: {e}")),
                }
            }
            Ok(None) => break,
            Err(e) => return bad_request(format!("malformed multipart body: {e}")),
        }
    }

    let Some((mime, bytes)) = upload else {
        return bad_request("no file field in upload");
    };

    let mut tmp = match tempfile::NamedTempFile::new() {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "failed to create temp file for upload");
            return internal_error("failed to stage upload");
        }
    };
    if let Err(e) = tmp.write_all(&bytes) {
        warn!(error = %e, "failed to write upload to temp file");
        return internal_error("failed to stage upload");
    }

    match state.templates.upload_file(tmp.path(), &mime).await {
        Ok(file_id) => Json(json!({"fileId": file_id})).into_response(),
        Err(e) => upstream_error(e),
    }
}
