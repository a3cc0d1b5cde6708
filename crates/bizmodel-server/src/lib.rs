//! # bizmodel-server
//!
//! HTTP front end for the projection workbook generator.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/generate-excel` | POST | xlsx attachment, or 500 `{"error": ...}` |
//! | `/health`, `/healthz` | GET | `{"status": "healthy"}` |
//! | `/`, `/index.html` | GET | static page, `no-cache` |
//! | `/sherloc_logo.jpg` | GET | static image, cached for a day |
//! | any | OPTIONS | CORS preflight |
//!
//! Every response carries `Access-Control-Allow-Origin: *`. Generation is
//! CPU-bound and runs on the blocking pool; each request builds its own
//! workbook in memory.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bizmodel_core::{Clock, ConfigurationError, GenerateError, SystemClock};
use bizmodel_render::WorkbookGenerator;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLSX_DISPOSITION: &str = "attachment; filename=\"business_model.xlsx\"";

const INDEX_FILE: &str = "index.html";
const LOGO_FILE: &str = "sherloc_logo.jpg";

/// Shared, read-only request context
pub struct AppState {
    pub generator: WorkbookGenerator,
    /// Directory holding `index.html` and the logo
    pub static_dir: PathBuf,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(generator: WorkbookGenerator, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            static_dir: static_dir.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock (tests pin the month axis with this)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/generate-excel", post(generate_excel).options(preflight))
        .route("/health", get(health).options(preflight))
        .route("/healthz", get(health).options(preflight))
        .route("/", get(index).options(preflight))
        .route("/index.html", get(index).options(preflight))
        .route("/sherloc_logo.jpg", get(logo).options(preflight))
        .fallback(fallback)
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Failure reported to the client as a 500 JSON body
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("Generation task failed: {0}")]
    Task(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        tracing::error!(error = %message, "workbook generation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn generate_excel(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let raw: Value = serde_json::from_slice(&body)
        .map_err(|e| GenerateError::from(ConfigurationError::MalformedJson(e.to_string())))?;

    let worker = Arc::clone(&state);
    let bytes = tokio::task::spawn_blocking(move || {
        worker
            .generator
            .generate_from_json(&raw, worker.clock.as_ref())
    })
    .await
    .map_err(|e| ApiError::Task(e.to_string()))??;

    tracing::info!(
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "served workbook"
    );
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, XLSX_DISPOSITION),
        ],
        bytes,
    )
        .into_response())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    static_file(&state, INDEX_FILE, "text/html; charset=utf-8", "no-cache").await
}

async fn logo(State(state): State<Arc<AppState>>) -> Response {
    static_file(&state, LOGO_FILE, "image/jpeg", "public, max-age=86400").await
}

async fn static_file(
    state: &AppState,
    name: &str,
    content_type: &'static str,
    cache_control: &'static str,
) -> Response {
    let path = state.static_dir.join(name);
    match tokio::fs::read(&path).await {
        Ok(contents) => (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, cache_control),
            ],
            contents,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "static file unavailable");
            (StatusCode::NOT_FOUND, format!("{name} not found")).into_response()
        }
    }
}

async fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
        .into_response()
}

async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return preflight().await;
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}
