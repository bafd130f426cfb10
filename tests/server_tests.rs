//! HTTP service tests
//!
//! The router runs in-process over a canned renderer; requests go through
//! `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use newsdesk_extract::server::{self, AppState};
use newsdesk_extract::{
    DomainConfig, DomainRegistry, ExtractionPipeline, PageRenderer, RenderError, RenderRequest,
    ResultCache,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct CannedRenderer;

impl PageRenderer for CannedRenderer {
    async fn render(&self, request: &RenderRequest) -> newsdesk_extract::Result<String> {
        if request.url.contains("offline") {
            return Err(RenderError::Network("connection refused".into()).into());
        }
        Ok(r#"<div class="story"><h1>Headline for the test story</h1>
            <p>Body paragraph with enough characters to survive.</p></div>"#
            .to_string())
    }
}

fn app() -> Router {
    let registry = Arc::new(DomainRegistry::new());
    registry
        .register(
            DomainConfig::builder("daily", "div.story").build(),
            &["daily.example"],
        )
        .unwrap();
    let pipeline = Arc::new(ExtractionPipeline::new(
        CannedRenderer,
        registry,
        Arc::new(ResultCache::default()),
    ));
    let state = Arc::new(AppState::new(pipeline).unwrap());
    server::router(state, &[])
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["version"], newsdesk_extract::VERSION);
}

#[tokio::test]
async fn test_extract_success() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json("/extract", json!({"url": "https://daily.example/a/1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["content"],
        "<h1>Headline for the test story</h1><p>Body paragraph with enough characters to survive.</p>"
    );
    assert_eq!(body["metadata"]["domain_name"], "daily");
    assert_eq!(body["metadata"]["url"], "https://daily.example/a/1");

    let (_, stats) = send(&app, get("/cache/stats")).await;
    assert_eq!(stats["size"], 1);
    assert_eq!(stats["ttl_seconds"], 300);
    assert_eq!(stats["entries"][0]["url_hash"].as_str().unwrap().len(), 8);
}

#[tokio::test]
async fn test_extract_unknown_domain_is_404() {
    let (status, body) = send(
        &app(),
        post_json(
            "/extract",
            json!({"url": "https://daily.example/a", "domain_name": "missing"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "config_not_found");
    assert!(body["detail"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_extract_with_adhoc_config() {
    let (status, body) = send(
        &app(),
        post_json(
            "/extract",
            json!({
                "url": "https://elsewhere.example/x",
                "config": {
                    "domain_name": "elsewhere",
                    "article_container_selector": "div.story",
                    "allowed_tags": ["h1"]
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "<h1>Headline for the test story</h1>");
}

#[tokio::test]
async fn test_render_failure_is_500() {
    let (status, body) = send(
        &app(),
        post_json("/extract", json!({"url": "https://daily.example/offline"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "render_network");
}

#[tokio::test]
async fn test_bad_url_and_bad_body_are_400() {
    let app = app();
    let (status, body) = send(&app, post_json("/extract", json!({"url": "file:///etc/hosts"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_url");

    let (status, body) = send(&app, post_json("/extract", json!({"link": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_domains_listing_and_registration() {
    let app = app();
    let (status, created) = send(
        &app,
        post_json(
            "/domains",
            json!({
                "config": {"domain_name": "weekly", "article_container_selector": "main"},
                "hostnames": ["weekly.example"]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);

    let (_, listing) = send(&app, get("/domains")).await;
    assert_eq!(listing["count"], 2);
    assert_eq!(listing["domains"], json!(["daily", "weekly"]));
    assert!(listing.get("details").is_none());

    let (_, detailed) = send(&app, get("/domains?include_details=true")).await;
    assert_eq!(detailed["details"][1]["domain_name"], "weekly");
    assert_eq!(detailed["details"][1]["wait_strategy"], "domcontentloaded");
    assert_eq!(detailed["details"][1]["config"]["min_text_length"], 25);
}

#[tokio::test]
async fn test_invalid_registration_is_400() {
    let (status, body) = send(
        &app(),
        post_json(
            "/domains",
            json!({"config": {"domain_name": "nothing"}, "hostnames": []}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "config_invalid");
}

#[tokio::test]
async fn test_cache_clear_and_status_counters() {
    let app = app();
    send(&app, post_json("/extract", json!({"url": "https://daily.example/1"}))).await;
    send(&app, post_json("/extract", json!({"url": "https://daily.example/2"}))).await;
    send(&app, post_json("/extract", json!({"url": "https://daily.example/offline"}))).await;

    let (_, status) = send(&app, get("/status")).await;
    assert_eq!(status["extractions"], 2);
    assert_eq!(status["errors"], 1);
    assert_eq!(status["cache_size"], 2);
    assert_eq!(status["latency"]["total_requests"], 2);

    let (code, cleared) = send(&app, Request::post("/cache/clear").body(Body::empty()).unwrap()).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(cleared["removed"], 2);
    assert_eq!(cleared["message"], "Cache cleared. Removed 2 entries.");
}

#[tokio::test]
async fn test_cors_allows_localhost_only() {
    let app = app();
    let preflight = |origin: &'static str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/extract")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let local = app.clone().oneshot(preflight("http://localhost:5173")).await.unwrap();
    assert_eq!(
        local.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );

    let remote = app.oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(remote
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
