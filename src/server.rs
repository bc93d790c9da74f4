//! HTTP front end for the assistant.
//!
//! Routes:
//! - `GET  /health`: liveness probe
//! - `POST /api/llama`: the JSON envelope of [`crate::api`]
//! - `POST /api/parse-pdf?filename=<name>`: raw document body → [`ExtractedDocument`]
//!
//! Failures are reported in the envelope shape (`{"success": false, "error": …}`)
//! with a status code chosen by [`ApiError`].

use crate::api::{AssistRequest, AssistResponse};
use crate::assistant::PaperAssistant;
use crate::config::ExtractOptions;
use crate::error::PaperLensError;
use crate::extract::extract_text_async;
use crate::output::ExtractedDocument;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Error body sent when no LLM provider could be resolved at startup.
pub const NOT_CONFIGURED: &str = "API key not configured";

/// Filename assumed when `/api/parse-pdf` is called without one.
pub const DEFAULT_UPLOAD_NAME: &str = "document.pdf";

/// Shared handler state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// `None` when no provider could be resolved; `/api/llama` then answers 500.
    pub assistant: Option<Arc<PaperAssistant>>,
    pub extract: ExtractOptions,
}

impl AppState {
    pub fn new(assistant: Option<Arc<PaperAssistant>>, extract: ExtractOptions) -> Self {
        Self { assistant, extract }
    }
}

/// Handler error: a library error plus the status it maps to.
#[derive(Debug)]
pub struct ApiError(PaperLensError);

impl From<PaperLensError> for ApiError {
    fn from(e: PaperLensError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PaperLensError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            PaperLensError::InputTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.0.to_string())
            }
            PaperLensError::ProviderNotConfigured { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, NOT_CONFIGURED.to_string())
            }
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        (status, Json(AssistResponse::failure(message))).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.extract.max_input_bytes;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let parse_route = post(parse_pdf).layer(match body_limit {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/llama", post(llama))
        .route("/api/parse-pdf", parse_route)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn llama(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AssistRequest>, JsonRejection>,
) -> Result<Json<AssistResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| PaperLensError::InvalidRequest(e.body_text()))?;
    request.validate()?;

    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| PaperLensError::ProviderNotConfigured {
            provider: "none".to_string(),
            hint: NOT_CONFIGURED.to_string(),
        })?;

    let response = assistant.handle(&request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct ParseParams {
    filename: Option<String>,
}

async fn parse_pdf(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ParseParams>,
    body: Bytes,
) -> Result<Json<ExtractedDocument>, ApiError> {
    let filename = params
        .filename
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
    info!("Parsing upload '{}' ({} bytes)", filename, body.len());
    let doc = extract_text_async(body.to_vec(), filename, &state.extract).await?;
    Ok(Json(doc))
}
