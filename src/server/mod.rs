//! HTTP surface: the front-end page and the single analysis endpoint.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

use crate::tutor::AnalysisPipeline;
use crate::{AnalyzeError, Result};

/// Page served when no `server.index_path` is configured
const BUILTIN_INDEX: &str = include_str!("../../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub index_path: Option<Arc<PathBuf>>,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline, index_path: Option<PathBuf>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            index_path: index_path.map(Arc::new),
        }
    }
}

/// Body of `POST /analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: Option<Value>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        let status = match err {
            AnalyzeError::InvalidUrl | AnalyzeError::TranscriptUnavailable => StatusCode::BAD_REQUEST,
            AnalyzeError::MissingApiKey | AnalyzeError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", err);
    }
    tracing::info!("Shutting down");
}

async fn index(State(state): State<AppState>) -> Html<String> {
    if let Some(path) = &state.index_path {
        match tokio::fs::read_to_string(path.as_path()).await {
            Ok(page) => return Html(page),
            Err(err) => tracing::warn!("Cannot read {}: {}, serving built-in page", path.display(), err),
        }
    }
    Html(BUILTIN_INDEX.to_string())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model_configured": state.pipeline.is_model_configured(),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    match run_analysis(&state, payload).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::warn!("Analysis failed ({}): {}", err.status, err.message);
            err.into_response()
        }
    }
}

async fn run_analysis(
    state: &AppState,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> std::result::Result<String, ApiError> {
    if !state.pipeline.is_model_configured() {
        return Err(AnalyzeError::MissingApiKey.into());
    }

    let url = match payload {
        Ok(Json(AnalyzeRequest { url: Some(Value::String(url)) })) => url,
        Ok(_) => return Err(AnalyzeError::InvalidUrl.into()),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection);
            return Err(AnalyzeError::InvalidUrl.into());
        }
    };

    Ok(state.pipeline.analyze(&url).await?)
}
