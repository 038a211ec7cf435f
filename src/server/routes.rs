//! Route handlers and shared application state.
//!
//! `/api/girls` is the only API route; everything else falls through to
//! static asset serving. Per-source failures never surface here — the
//! aggregator contains them — so a 500 from this layer means something
//! genuinely unexpected (serialization, cache subsystem).

use anyhow::Context;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::cache::{CachedResponse, ResponseCache};
use crate::types::Credentials;

const API_GIRLS_PATH: &str = "/api/girls";

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct AppState {
    pub aggregator: Aggregator,
    pub cache: ResponseCache,
    /// Advertised to clients via `Cache-Control: max-age`; kept equal to
    /// the server-side cache TTL.
    pub cache_ttl_secs: u64,
    pub static_dir: Option<PathBuf>,
}

pub type SharedState = Arc<AppState>;

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Wrapper converting any unexpected handler error into a generic 500 JSON
/// body. Details are logged server-side and echoed in the `details` field,
/// matching the endpoint contract.
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Unexpected error handling request");
        let body = Json(serde_json::json!({
            "error": "Failed to fetch or aggregate data.",
            "details": self.0.to_string(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/girls — aggregated model counts per country.
///
/// Served from the response cache when a fresh entry exists; otherwise runs
/// the aggregation and writes the cache in the background so the response
/// is never delayed by the write.
pub async fn get_girls(State(state): State<SharedState>) -> Result<Response, ApiError> {
    if let Some(cached) = state.cache.get(API_GIRLS_PATH).await {
        info!("Cache HIT for /api/girls");
        return Ok(json_response(cached.body, state.cache_ttl_secs)?);
    }

    info!("Cache MISS for /api/girls. Fetching fresh data...");

    // Credentials are read from the environment at call time.
    let credentials = Credentials::from_env();
    let data = state.aggregator.get_aggregated_data(&credentials).await;

    let body = serde_json::to_string_pretty(&data)
        .context("Failed to serialise aggregated data")?;

    let cache = state.cache.clone();
    let cached = CachedResponse { body: body.clone() };
    tokio::spawn(async move {
        cache.put(API_GIRLS_PATH, cached).await;
    });

    Ok(json_response(body, state.cache_ttl_secs)?)
}

fn json_response(body: String, max_age_secs: u64) -> anyhow::Result<Response> {
    let cache_control = HeaderValue::from_str(&format!("public, max-age={max_age_secs}"))
        .context("Invalid Cache-Control value")?;

    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp.headers_mut().insert(header::CACHE_CONTROL, cache_control);
    Ok(resp)
}

/// Fallback for all non-API paths: serve static assets from the configured
/// directory. Not configured → 500; file not found → 404 (ServeDir's own
/// behavior).
pub async fn static_assets(State(state): State<SharedState>, req: Request) -> Response {
    let Some(dir) = &state.static_dir else {
        error!("Static asset serving is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Static asset serving is not configured.",
        )
            .into_response();
    };

    match ServeDir::new(dir).oneshot(req).await {
        Ok(resp) => resp.map(Body::new),
        Err(e) => {
            error!(error = %e, "Error serving static asset");
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
