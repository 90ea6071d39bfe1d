use super::*;
use crate::Config;
use crate::service::test_helpers::{ARTICLE_TEXT, FixedSummarizer, test_config};
use crate::summarizer::ArticleSummarizer;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;


const TOKEN: &str = "test-key";

fn client_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40_000))
}

/// Test config: API key set, rate limiting off unless a test turns it on
fn api_config(tweak: impl FnOnce(&mut Config)) -> Config {
    let mut config = test_config();
    config.server.api.api_key = Some(TOKEN.to_string());
    config.server.api.rate_limit.enabled = false;
    tweak(&mut config);
    config
}

/// Router plus the service behind it
async fn test_app(
    summarizer: Arc<dyn ArticleSummarizer>,
    tweak: impl FnOnce(&mut Config),
) -> (Router, SummaryService) {
    let config = api_config(tweak);
    let service = SummaryService::new(config, summarizer).await.unwrap();
    (create_router(service.clone()), service)
}

async fn default_app() -> (Router, SummaryService) {
    test_app(Arc::new(FixedSummarizer::default()), |_| {}).await
}

fn article() -> Value {
    json!({ "title": "Bitcoin rallies", "text": ARTICLE_TEXT })
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request from `addr`; returns status, headers and the JSON body (Null if not JSON)
async fn send_from(
    app: &Router,
    addr: SocketAddr,
    request: Request<Body>,
) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .clone()
        .layer(MockConnectInfo(addr))
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send_from(app, client_addr(), request).await;
    (status, body)
}

/// Poll `GET /task/{id}` until the task is terminal
async fn poll_until_done(app: &Router, task_id: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (status, body) = send(app, get(&format!("/task/{task_id}"), Some(TOKEN))).await;
            assert_eq!(status, StatusCode::OK);
            if body["status"] == "completed" || body["status"] == "failed" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task finished in time")
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, service) = test_app(Arc::new(FixedSummarizer::default()), |c| {
        c.server.api.cors_enabled = true;
        c.server.api.cors_origins = vec!["*".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send_from(&app, client_addr(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("access-control-allow-origin"));
    service.shutdown().await;
}

#[tokio::test]
async fn test_cors_disabled() {
    let (app, service) = test_app(Arc::new(FixedSummarizer::default()), |c| {
        c.server.api.cors_enabled = false;
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send_from(&app, client_addr(), request).await;

    assert!(!headers.contains_key("access-control-allow-origin"));
    service.shutdown().await;
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, service) = default_app().await;
    for uri in ["/summaries", "/tasks", "/task"] {
        let (status, _) = send(&app, get(uri, Some(TOKEN))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
    service.shutdown().await;
}
