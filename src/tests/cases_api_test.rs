use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::app::build_router;
use crate::config::new_test_config;
use crate::model::Status;
use crate::registry::{InMemoryRegistry, Registry};
use crate::tests::support::test_record;

fn api() -> (Router, Arc<dyn Registry>) {
    let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::new());
    (build_router(new_test_config(), registry.clone()), registry)
}

async fn send_json(router: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, req).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, req).await
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn register_creates_service_with_unknown_status() {
    let (router, registry) = api();

    let (status, body) = send_json(
        &router,
        "POST",
        "/register",
        json!({
            "name": "svc-a",
            "endpoint": "http://svc-a:9001/health",
            "frequency_seconds": 60,
            "recipients": ["ops@example.com"],
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "service registered");
    assert_eq!(body["service"]["name"], "svc-a");
    assert_eq!(body["service"]["status"], "UNKNOWN");

    let stored = registry.get("svc-a").unwrap().unwrap();
    assert_eq!(stored.interval, Duration::from_secs(60));
    assert_eq!(stored.recipients, vec!["ops@example.com".to_string()]);
}

#[tokio::test]
async fn register_rejects_blank_name() {
    let (router, _) = api();

    let (status, body) = send_json(
        &router,
        "POST",
        "/register",
        json!({"name": "  ", "endpoint": "http://svc/health"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "service name is required");
}

#[tokio::test]
async fn register_rejects_non_http_endpoint() {
    let (router, _) = api();

    for endpoint in ["ftp://svc/health", "svc:9001", "not a url"] {
        let (status, body) = send_json(
            &router,
            "POST",
            "/register",
            json!({"name": "svc-a", "endpoint": endpoint}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "endpoint: {endpoint}");
        assert_eq!(body["error"], "endpoint must use an http or https scheme");
    }
}

#[tokio::test]
async fn too_frequent_interval_is_clamped_to_default() {
    let (router, registry) = api();

    // Test config: min 10s, default 30s. 5s is below the floor.
    let (status, _) = send_json(
        &router,
        "POST",
        "/register",
        json!({"name": "svc-a", "endpoint": "http://svc/health", "frequency_seconds": 5}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let stored = registry.get("svc-a").unwrap().unwrap();
    assert_eq!(stored.interval, Duration::from_secs(30));
}

#[tokio::test]
async fn omitted_frequency_uses_default_interval() {
    let (router, registry) = api();

    send_json(
        &router,
        "POST",
        "/register",
        json!({"name": "svc-a", "endpoint": "http://svc/health"}),
    )
    .await;

    let stored = registry.get("svc-a").unwrap().unwrap();
    assert_eq!(stored.interval, Duration::from_secs(30));
}

#[tokio::test]
async fn reregister_keeps_observed_state() {
    let (router, registry) = api();

    send_json(
        &router,
        "POST",
        "/register",
        json!({"name": "svc-a", "endpoint": "http://old/health"}),
    )
    .await;
    registry
        .update_status("svc-a", Status::Down, Utc::now())
        .unwrap();

    let (status, body) = send_json(
        &router,
        "POST",
        "/register",
        json!({"name": "svc-a", "endpoint": "http://new/health"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["service"]["endpoint"], "http://new/health");
    assert_eq!(body["service"]["status"], "DOWN");
}

#[tokio::test]
async fn health_lists_all_registered_services() {
    let (router, registry) = api();
    registry
        .register(test_record("svc-a", "http://a/health", Duration::from_secs(30)))
        .unwrap();
    registry
        .register(test_record("svc-b", "http://b/health", Duration::from_secs(30)))
        .unwrap();
    registry
        .update_status("svc-b", Status::Alarm, Utc::now())
        .unwrap();

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let services = body.as_array().unwrap();
    assert_eq!(services.len(), 2);
    let svc_b = services.iter().find(|s| s["name"] == "svc-b").unwrap();
    assert_eq!(svc_b["status"], "ALARM");
}

#[tokio::test]
async fn health_by_name_returns_record_or_404() {
    let (router, registry) = api();
    registry
        .register(test_record("svc-a", "http://a/health", Duration::from_secs(30)))
        .unwrap();

    let (status, body) = get(&router, "/health/svc-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "svc-a");
    assert_eq!(body["status"], "UNKNOWN");

    let (status, body) = get(&router, "/health/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn deregister_removes_service_once() {
    let (router, registry) = api();
    registry
        .register(test_record("svc-a", "http://a/health", Duration::from_secs(30)))
        .unwrap();

    let req = Request::builder()
        .method("DELETE")
        .uri("/register/svc-a")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "service deregistered");
    assert!(registry.get("svc-a").unwrap().is_none());

    let req = Request::builder()
        .method("DELETE")
        .uri("/register/svc-a")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn config_endpoint_exposes_current_settings() {
    let (router, _) = api();

    let (status, body) = get(&router, "/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["monitor"]["env"], "test");
    assert!(body["monitor"]["checker"].is_object());
}
