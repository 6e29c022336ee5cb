//! HTTP JSON API.
//!
//! Exposes the retrieval surface to presentation layers (cards, grids,
//! themes — all of which are pure consumers of the feed). The server holds
//! one store handle, one text encoder, and one upstream client for its
//! whole lifetime; all three are constructed once at startup and injected
//! into the handlers through shared state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/feed` | Ranked or chronological feed |
//! | `POST` | `/records/read` | Mark a record read (JSON body `{ "doi": ... }`) |
//! | `POST` | `/sync` | Run an incremental sync |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "threshold must be in [0.0, 1.0]" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based
//! presentation variants can call the API directly.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::embedding::{self, TextEncoder};
use crate::feed::{self, FeedError};
use crate::ingest;
use crate::models::FeedItem;
use crate::openalex::{OpenAlexClient, WorkFetcher};
use crate::store::{CorpusStore, SqliteStore, StoreError};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn CorpusStore>,
    encoder: Arc<dyn TextEncoder>,
    fetcher: Arc<dyn WorkFetcher>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated. The store, encoder, and upstream client are
/// created once here and shared across requests.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config.db.path).await?;
    store.run_migrations().await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(store),
        encoder: Arc::from(embedding::create_encoder(&config.embedding)?),
        fetcher: Arc::new(OpenAlexClient::new(&config.openalex)?),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/feed", get(handle_feed))
        .route("/records/read", post(handle_mark_read))
        .route("/sync", post(handle_sync))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    let bind_addr = &config.server.bind;
    println!("litfeed server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map a feed error to an HTTP status: validation and configuration
/// problems are the client's to fix, the rest are ours.
impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::InvalidThreshold(_) | FeedError::EncoderDisabled => {
                bad_request(err.to_string())
            }
            FeedError::Store(_) | FeedError::Ranking(_) => internal(err.to_string()),
        }
    }
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

// ============ GET /feed ============

#[derive(Deserialize)]
struct FeedParams {
    /// Comma-separated OpenAlex source ids; empty means every source.
    sources: Option<String>,
    query: Option<String>,
    threshold: Option<f32>,
}

#[derive(Serialize)]
struct FeedResponse {
    items: Vec<FeedItem>,
}

async fn handle_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>, AppError> {
    let selected: Vec<String> = params
        .sources
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_string())
        .collect();

    let items = feed::get_feed(
        &state.config,
        state.store.as_ref(),
        state.encoder.as_ref(),
        &selected,
        params.query.as_deref(),
        params.threshold,
    )
    .await?;

    Ok(Json(FeedResponse { items }))
}

// ============ POST /records/read ============

#[derive(Deserialize)]
struct MarkReadRequest {
    doi: String,
}

async fn handle_mark_read(
    State(state): State<AppState>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.doi.trim().is_empty() {
        return Err(bad_request("doi must not be empty"));
    }

    match feed::mark_read(state.store.as_ref(), &request.doi).await {
        Ok(()) => Ok(Json(serde_json::json!({ "doi": request.doi, "is_read": true }))),
        Err(StoreError::NotFound(doi)) => Err(not_found(format!("record not found: {}", doi))),
        Err(e) => Err(internal(e.to_string())),
    }
}

// ============ POST /sync ============

#[derive(Deserialize, Default)]
struct SyncRequest {
    /// Subscription names or raw source ids; empty means every configured
    /// subscription.
    #[serde(default)]
    sources: Vec<String>,
}

#[derive(Serialize)]
struct SyncResponse {
    fetched: usize,
    inserted: u64,
    skipped_existing: u64,
    issues: Vec<String>,
}

async fn handle_sync(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, AppError> {
    let source_ids = state.config.resolve_sources(&request.sources);
    if source_ids.is_empty() {
        return Err(bad_request(
            "no sources selected and no [sources] configured",
        ));
    }

    let report = ingest::run_sync(
        &state.config,
        state.fetcher.as_ref(),
        state.store.as_ref(),
        &source_ids,
    )
    .await
    .map_err(|e| internal(e.to_string()))?;

    Ok(Json(SyncResponse {
        fetched: report.fetched,
        inserted: report.inserted,
        skipped_existing: report.skipped_existing,
        issues: report.issue_messages(),
    }))
}
