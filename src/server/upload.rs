//! Client upload flow: presign, `PUT` the bytes, read them back.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};

use super::{ApiError, AppState};
use crate::storage::BlobError;

const MISSING_TOKEN: &str = "Server configuration error: Missing Blob token.";
const REACHABLE: &str = "GET request to /api/upload-blob successful.";

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: String,
}

/// `POST /api/upload-blob`.
pub async fn presign(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    if !state.blobs.can_sign() {
        error!("upload requested but no signing secret is configured");
        return Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, MISSING_TOKEN));
    }

    let request: Value = serde_json::from_slice(&body).map_err(|e| {
        ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    })?;

    if request.get("completed").and_then(Value::as_bool) == Some(true) {
        let blob = request.get("blob").cloned().unwrap_or_default();
        info!(%blob, "client upload completed");
        return Ok(Json(json!({ "status": "ok" })));
    }

    let pathname = request
        .get("pathname")
        .or_else(|| request.get("filename"))
        .and_then(Value::as_str)
        .unwrap_or("upload");
    let content_type = request.get("contentType").and_then(Value::as_str);

    let upload = state.blobs.presign(pathname, content_type).map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Blob upload processing failed: {e}"),
        )
    })?;
    Ok(Json(json!(upload)))
}

/// `GET /api/upload-blob`.
pub async fn reachable() -> Json<Value> {
    Json(json!({ "message": REACHABLE }))
}

/// `PUT /blobs/:key?token=...`.
pub async fn store(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let url = state
        .blobs
        .put(&key, &query.token, &body)
        .await
        .map_err(blob_error)?;
    Ok(Json(json!({ "url": url, "pathname": key })))
}

/// `GET /blobs/:key`.
pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state
        .blobs
        .get(&key)
        .await
        .map_err(blob_error)?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("No blob named {key}")))?;

    let mime = mime_guess::from_path(&key).first_or_octet_stream();
    Ok(([(CONTENT_TYPE, mime.essence_str().to_string())], bytes).into_response())
}

fn blob_error(err: BlobError) -> ApiError {
    let status = match err {
        BlobError::BadToken => StatusCode::FORBIDDEN,
        BlobError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        BlobError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
        BlobError::Io(ref e) => {
            error!(error = %e, "blob storage failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    ApiError::new(status, err.to_string())
}
