//! HTTP request boundary.
//!
//! Thin axum layer over the retrieval chain and the resource catalog.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Answer a question against one resource |
//! | `GET`  | `/resources` | List resources with a complete index |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Missing request fields return `400 {"message": "..."}` with stable
//! message text; everything else returns `{"error": "..."}` with a status
//! per error kind: 404 resource not found, 502 upstream failure, 504
//! upstream timeout, 500 otherwise. Wrong methods on known paths get a 405
//! from axum's method routing. Error bodies carry a short message only —
//! no internal detail.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog;
use crate::chain::RetrievalChain;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::ChatError;
use crate::generation::Generator;
use crate::models::{ChatResponse, ChatTurn};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
}

/// Start the HTTP server on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind.clone();
    let app = build_router(state);

    println!("pdfchat server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router; separated from [`run_server`] so tests can drive it
/// without binding a socket.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handle_chat))
        .route("/resources", get(handle_resources))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// Internal error that renders as an HTTP response. 400s use a `message`
/// body; other statuses use an `error` body.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = if self.status == StatusCode::BAD_REQUEST {
            serde_json::json!({ "message": self.message })
        } else {
            serde_json::json!({ "error": self.message })
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        let status = match &err {
            ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ChatError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ChatError::CorruptIndex { .. } | ChatError::IndexBuild(_) | ChatError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

// ============ POST /chat ============

/// Request body for `POST /chat`. `history` arrives as `[question, answer]`
/// pairs, matching the client's transcript format.
#[derive(Deserialize)]
struct ChatRequest {
    question: Option<String>,
    resource_name: Option<String>,
    #[serde(default)]
    history: Vec<(String, String)>,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let question = request
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(AppError {
            status: StatusCode::BAD_REQUEST,
            message: "No question in the request".to_string(),
        })?;

    let resource_name = request
        .resource_name
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(AppError {
            status: StatusCode::BAD_REQUEST,
            message: "No resource_name in the request".to_string(),
        })?;

    let history: Vec<ChatTurn> = request
        .history
        .iter()
        .map(|(q, a)| ChatTurn::new(q.clone(), a.clone()))
        .collect();

    let chain = RetrievalChain::new(&state.config, &*state.embedder, &*state.generator);
    let response = chain.answer(resource_name, question, &history).await?;

    Ok(Json(response))
}

// ============ GET /resources ============

async fn handle_resources(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(catalog::list_available(&state.config.paths.index_dir))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
