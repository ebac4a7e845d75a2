//! Web UI server.
//!
//! Serves the single-page chat UI and the JSON API it calls. Everything a
//! handler does is plumbing: lock the session, call the ingestor or the
//! dispatcher, translate the outcome to JSON.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Single-page chat UI |
//! | `GET`  | `/api/health` | Health check (returns version) |
//! | `GET`  | `/api/session` | Key presence, mode, documents, turn count |
//! | `POST` | `/api/session` | Update API key and/or query mode |
//! | `POST` | `/api/upload` | Multipart upload; per-file outcomes |
//! | `POST` | `/api/query` | Ask a question; returns the appended turn |
//! | `GET`  | `/api/history` | Ordered chat turns |
//! | `DELETE` | `/api/history` | Clear the chat history |
//!
//! # Error Contract
//!
//! All error responses follow one schema:
//!
//! ```json
//! { "error": { "code": "empty_index", "message": "no documents ingested yet" } }
//! ```
//!
//! Error codes: `bad_request` (400), `authentication_error` (401),
//! `empty_index` (409), `payload_too_large` (413), `unsupported_format`
//! (415), `engine_error` (502).
//!
//! # Concurrency
//!
//! One request is in flight at a time: every mutating handler holds the
//! session mutex across its engine call, and the page disables its
//! controls while waiting. There are no background workers.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::engine::{HttpRagEngine, RagEngine};
use crate::ingest::{self, IngestError};
use crate::models::{ChatTurn, IngestedDocument, QueryMode};
use crate::query::{self, ChatError};
use crate::session::Session;

static INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    engine: Arc<dyn RagEngine>,
    /// The one session this process serves. The mutex is held across
    /// engine calls, which is what serializes user actions.
    session: Arc<Mutex<Session>>,
}

/// Starts the web UI server with the production HTTP engine client.
///
/// Binds to `[server].bind`, seeds the session key from the configured
/// environment variable when present, and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let engine = Arc::new(HttpRagEngine::new(&config.engine)?);

    match engine.health().await {
        Ok(true) => tracing::info!(url = %config.engine.base_url, "engine is ready"),
        Ok(false) => tracing::warn!(url = %config.engine.base_url, "engine reported unhealthy"),
        Err(e) => tracing::warn!(url = %config.engine.base_url, error = %e, "engine unreachable at startup"),
    }

    run_server_with_engine(config, engine).await
}

/// Like [`run_server`], but with a caller-supplied engine implementation.
pub async fn run_server_with_engine(
    config: &Config,
    engine: Arc<dyn RagEngine>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = build_app(config.clone(), engine);

    println!("docchat listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router with a session seeded from the environment.
pub fn build_app(config: Config, engine: Arc<dyn RagEngine>) -> Router {
    let session = Session::with_api_key(config.resolve_api_key());
    // Room for multipart framing on top of the per-file cap.
    let body_limit = config.ingest.max_file_bytes + 1024 * 1024;

    let state = AppState {
        config: Arc::new(config),
        engine,
        session: Arc::new(Mutex::new(session)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/api/health", get(handle_health))
        .route("/api/session", get(handle_get_session).post(handle_update_session))
        .route("/api/upload", post(handle_upload))
        .route("/api/query", post(handle_query))
        .route("/api/history", get(handle_history).delete(handle_clear_history))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize, Clone)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

/// Maps a dispatch failure to the response contract. Only upstream or
/// precondition failures reach this point; a successful dispatch already
/// appended its turn.
fn classify_chat_error(err: ChatError) -> AppError {
    match err {
        ChatError::EmptyQuestion => bad_request("question must not be empty"),
        ChatError::Authentication(m) => AppError {
            status: StatusCode::UNAUTHORIZED,
            code: "authentication_error",
            message: m,
        },
        ChatError::EmptyIndex => AppError {
            status: StatusCode::CONFLICT,
            code: "empty_index",
            message: "no documents ingested yet — upload documents first".to_string(),
        },
        ChatError::Engine(e) => AppError {
            status: StatusCode::BAD_GATEWAY,
            code: "engine_error",
            message: e.to_string(),
        },
    }
}

/// Per-file error detail used inside a batch upload response.
fn ingest_error_detail(err: &IngestError) -> ErrorDetail {
    let code = match err {
        IngestError::UnsupportedFormat(_) => "unsupported_format",
        IngestError::TooLarge { .. } => "payload_too_large",
        IngestError::Extract(_) | IngestError::EmptyDocument => "bad_request",
        IngestError::Engine(crate::engine::EngineError::Authentication(_)) => {
            "authentication_error"
        }
        IngestError::Engine(_) => "engine_error",
    };
    ErrorDetail {
        code: code.to_string(),
        message: err.to_string(),
    }
}

// ============ GET / ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============ GET /api/health ============

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

// ============ GET/POST /api/session ============

#[derive(Serialize)]
struct SessionView {
    has_api_key: bool,
    mode: QueryMode,
    documents: Vec<IngestedDocument>,
    turn_count: usize,
}

async fn handle_get_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.lock().await;
    Json(SessionView {
        has_api_key: session.api_key().is_some(),
        mode: session.mode(),
        documents: session.documents().to_vec(),
        turn_count: session.turns().len(),
    })
}

#[derive(Deserialize)]
struct SessionUpdate {
    /// New API key; an empty string clears the stored key.
    api_key: Option<String>,
    mode: Option<QueryMode>,
}

async fn handle_update_session(
    State(state): State<AppState>,
    Json(update): Json<SessionUpdate>,
) -> Json<SessionView> {
    let mut session = state.session.lock().await;
    if let Some(key) = update.api_key {
        session.set_api_key(Some(key));
    }
    if let Some(mode) = update.mode {
        session.set_mode(mode);
    }
    Json(SessionView {
        has_api_key: session.api_key().is_some(),
        mode: session.mode(),
        documents: session.documents().to_vec(),
        turn_count: session.turns().len(),
    })
}

// ============ POST /api/upload ============

#[derive(Serialize)]
struct UploadResponse {
    results: Vec<UploadResult>,
}

#[derive(Serialize)]
struct UploadResult {
    name: String,
    ok: bool,
    deduplicated: bool,
    document: Option<IngestedDocument>,
    error: Option<ErrorDetail>,
}

/// Handler for `POST /api/upload`.
///
/// Accepts any number of file fields. Files are ingested one at a time and
/// independently; the response always carries one entry per file, in
/// upload order. Only a malformed multipart body turns into an HTTP error.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("malformed multipart body: {}", e)))?
    {
        let name = match field.file_name() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => continue,
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read '{}': {}", name, e)))?;
        files.push((name, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(bad_request("no files in upload"));
    }

    let mut session = state.session.lock().await;
    let outcomes = ingest::ingest_batch(
        state.engine.as_ref(),
        &state.config,
        &mut session,
        files,
    )
    .await;

    let results = outcomes
        .into_iter()
        .map(|(name, outcome)| match outcome {
            Ok(o) => UploadResult {
                name,
                ok: true,
                deduplicated: o.deduplicated,
                document: Some(o.document),
                error: None,
            },
            Err(e) => UploadResult {
                name,
                ok: false,
                deduplicated: false,
                document: None,
                error: Some(ingest_error_detail(&e)),
            },
        })
        .collect();

    Ok(Json(UploadResponse { results }))
}

// ============ POST /api/query ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    /// Optional override; defaults to the session's selected mode.
    mode: Option<QueryMode>,
}

async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<ChatTurn>, AppError> {
    let mut session = state.session.lock().await;
    let turn = query::dispatch_query(
        state.engine.as_ref(),
        &mut session,
        &req.question,
        req.mode,
    )
    .await
    .map_err(classify_chat_error)?;

    Ok(Json(turn))
}

// ============ GET/DELETE /api/history ============

#[derive(Serialize)]
struct HistoryResponse {
    turns: Vec<ChatTurn>,
}

async fn handle_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let session = state.session.lock().await;
    Json(HistoryResponse {
        turns: session.turns().to_vec(),
    })
}

async fn handle_clear_history(State(state): State<AppState>) -> StatusCode {
    let mut session = state.session.lock().await;
    session.clear_turns();
    StatusCode::NO_CONTENT
}
