//! HTTP boundary — Axum server.
//!
//! One JSON endpoint (`/api/girls`) backed by the aggregator and the
//! response cache, CORS on every response, OPTIONS preflight answered with
//! 204, and a static-asset fallback for everything else.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::info;

use routes::SharedState;

/// Start the HTTP server and block until shutdown.
pub async fn serve(state: SharedState, port: u16) -> Result<()> {
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!(port, "Listening on http://0.0.0.0:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received.");
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/girls", get(routes::get_girls))
        .fallback(routes::static_assets)
        .layer(middleware::from_fn(apply_cors))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

const ALLOW_METHODS: &str = "GET, HEAD, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
/// Preflight responses may be cached for a day.
const MAX_AGE_SECS: &str = "86400";

/// Add the allow-all CORS header set to every response and answer OPTIONS
/// preflight requests with 204 before they reach the router.
async fn apply_cors(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        insert_cors_headers(resp.headers_mut());
        return resp;
    }

    let mut resp = next.run(req).await;
    insert_cors_headers(resp.headers_mut());
    resp
}

fn insert_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
