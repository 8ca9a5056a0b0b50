//! HTTP surface: the two pipeline stages, upload presigning, and blob
//! storage for uploaded files.

pub mod handlers;
pub mod upload;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::consts::MAX_UPLOAD_BYTES;
use crate::engine::AssessmentEngine;
use crate::storage::LocalBlobStore;

/// Shared across every request.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AssessmentEngine>,
    pub blobs: Arc<LocalBlobStore>,
}

/// A JSON `{"error": ...}` response with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/plan", post(handlers::plan))
        .route("/api/final", post(handlers::final_assessment))
        .route(
            "/api/upload-blob",
            post(upload::presign).get(upload::reachable),
        )
        .route("/blobs/:key", get(upload::download).put(upload::store))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
