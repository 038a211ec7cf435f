//! End-to-end test: a mocked provider API behind the real Stripchat source,
//! the real aggregator, and the real router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use camcensus::aggregator::Aggregator;
use camcensus::cache::ResponseCache;
use camcensus::server::build_router;
use camcensus::server::routes::AppState;
use camcensus::sources::stripchat::StripchatSource;
use httpmock::prelude::*;
use tower::ServiceExt;

fn set_credentials_env() {
    // Credentials are read from the process environment at request time.
    std::env::set_var("STRIPCHAT_USERID", "12345");
    std::env::set_var("STRIPCHAT_BEARER", "token-abc");
}

fn app_for(server: &MockServer) -> axum::Router {
    let source = StripchatSource::with_api_url(server.url("/models")).unwrap();
    let aggregator = Aggregator::new(vec![Box::new(source)]).unwrap();
    let state = Arc::new(AppState {
        aggregator,
        cache: ResponseCache::new(Duration::from_secs(60)),
        cache_ttl_secs: 60,
        static_dir: None,
    });
    build_router(state)
}

#[tokio::test]
async fn full_stack_aggregation() {
    set_credentials_env();

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/models")
                .query_param("userId", "12345")
                .header("authorization", "Bearer token-abc");
            then.status(200).json_body(serde_json::json!({
                "models": [
                    {"modelsCountry": "fr", "username": "a"},
                    {"modelsCountry": "FR", "username": "b"},
                    {"modelsCountry": "de", "username": "c"},
                    {"modelsCountry": "xx1", "username": "d"},
                    {"username": "e"},
                ]
            }));
        })
        .await;

    let app = app_for(&server);
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/girls")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "public, max-age=60");
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, serde_json::json!({"FR": 2, "DE": 1}));
}

#[tokio::test]
async fn provider_outage_yields_empty_mapping_not_error() {
    set_credentials_env();

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/models");
            then.status(502).body("bad gateway");
        })
        .await;

    let app = app_for(&server);
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/girls")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // The failing source is isolated inside the aggregator; the endpoint
    // still answers 200 with an empty mapping.
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, serde_json::json!({}));
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    set_credentials_env();

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/models");
            then.status(200).json_body(serde_json::json!({
                "models": [{"modelsCountry": "jp"}]
            }));
        })
        .await;

    let app = app_for(&server);

    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/girls")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Cache write is async; give the spawned task a moment.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = app
        .oneshot(
            Request::builder()
                .uri("/api/girls")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn options_preflight_any_path() {
    let server = MockServer::start_async().await;
    let app = app_for(&server);

    let resp = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/girls")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_MAX_AGE], "86400");
}
