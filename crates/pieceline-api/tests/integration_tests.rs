//! # Integration Tests for pieceline-api
//!
//! Health probes, archive queries, and sync runs against a mock
//! distribution, driven through the router with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pieceline_api::state::AppState;
use pieceline_archive::ArchiveIndex;
use pieceline_client::PiecelineClient;
use pieceline_sync::{SyncConfig, SyncPipeline};

/// Helper: state wired to `base` with an in-memory archive.
async fn test_state(base: &str, root: &std::path::Path) -> AppState {
    let config = SyncConfig::local_mock(base, root).unwrap();
    let client = PiecelineClient::new(config.client.clone()).unwrap();
    let archive = ArchiveIndex::open_in_memory().await.unwrap();
    AppState::new(SyncPipeline::new(client, archive, &config))
}

fn token(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    format!("{header}.{body}.sig")
}

async fn mount_token(server: &MockServer, at: &str, payload: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(token(payload)))
        .mount(server)
        .await;
}

/// A distribution whose manifest lists no pieces and no files.
async fn mount_empty_distribution(server: &MockServer, version: &str) {
    mount_token(
        server,
        "/bootstrap.json",
        json!({"environments": {"production": {"id": "prod", "version": version}}}),
    )
    .await;
    mount_token(
        server,
        "/catalog/prod/catalog.json",
        json!({
            "metafile": format!("{}/manifest.json", server.uri()),
            "config": {"remote": {"baseUrl": server.uri(), "pieceFormat": "{TargetDigest}"}}
        }),
    )
    .await;
    mount_token(
        server,
        "/manifest.json",
        json!({"pieces": {"digests": []}, "files": []}),
    )
    .await;
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let dir = tempfile::tempdir().unwrap();
    let app = pieceline_api::app(test_state("http://127.0.0.1:1", dir.path()).await);
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let dir = tempfile::tempdir().unwrap();
    let app = pieceline_api::app(test_state("http://127.0.0.1:1", dir.path()).await);
    let response = app.oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Archive Queries ----------------------------------------------------------

#[tokio::test]
async fn test_latest_unknown_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = pieceline_api::app(test_state("http://127.0.0.1:1", dir.path()).await);
    let response = app.oneshot(get("/v1/archive/osrs/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 404);
    assert_eq!(body["error"]["kind"], "not_found");
}

#[tokio::test]
async fn test_latest_and_versions() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state("http://127.0.0.1:1", dir.path()).await;
    let archive = state.pipeline.archive();
    archive.record("osrs", "1.0", "/out/osrs/1.0").await.unwrap();
    archive.record("osrs", "2.0", "/out/osrs/2.0").await.unwrap();
    let app = pieceline_api::app(state);

    let response = app.clone().oneshot(get("/v1/archive/osrs/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let latest = body_json(response).await;
    assert_eq!(latest["version"], "2.0");
    assert_eq!(latest["path"], "/out/osrs/2.0");

    let response = app.oneshot(get("/v1/archive/osrs/versions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["binary_id"], "osrs");
    assert_eq!(body["count"], 2);
    assert_eq!(body["versions"][0]["version"], "2.0");
    assert_eq!(body["versions"][1]["version"], "1.0");
}

#[tokio::test]
async fn test_versions_unknown_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = pieceline_api::app(test_state("http://127.0.0.1:1", dir.path()).await);
    let response = app.oneshot(get("/v1/archive/rs3/versions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 0);
}

// -- Sync Trigger -------------------------------------------------------------

#[tokio::test]
async fn test_sync_then_skip() {
    let server = MockServer::start().await;
    mount_empty_distribution(&server, "42").await;
    let dir = tempfile::tempdir().unwrap();
    let app = pieceline_api::app(test_state(&server.uri(), dir.path()).await);

    let response = app.clone().oneshot(post("/v1/sync")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    assert_eq!(first["version"], "42");
    assert_eq!(first["skipped"], false);
    assert_eq!(first["mergedPiecesSize"], 0);

    let response = app.clone().oneshot(post("/v1/sync")).await.unwrap();
    let second = body_json(response).await;
    assert_eq!(second["skipped"], true);

    let response = app.oneshot(post("/v1/sync?force=true")).await.unwrap();
    assert_eq!(body_json(response).await["skipped"], false);
}

#[tokio::test]
async fn test_sync_upstream_failure_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bootstrap.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let app = pieceline_api::app(test_state(&server.uri(), dir.path()).await);

    let response = app.oneshot(post("/v1/sync")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["kind"], "fetch");
}

#[tokio::test]
async fn test_sync_decode_failure_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bootstrap.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("garbage"))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let app = pieceline_api::app(test_state(&server.uri(), dir.path()).await);

    let response = app.oneshot(post("/v1/sync")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["kind"], "decode");
}

#[tokio::test]
async fn test_inspect_returns_documents() {
    let server = MockServer::start().await;
    mount_empty_distribution(&server, "7").await;
    let dir = tempfile::tempdir().unwrap();
    let app = pieceline_api::app(test_state(&server.uri(), dir.path()).await);

    let response = app.oneshot(get("/v1/inspect")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["base"]["environments"]["production"]["version"], "7");
    assert!(body["manifest"]["files"].as_array().unwrap().is_empty());
}
