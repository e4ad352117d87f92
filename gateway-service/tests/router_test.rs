mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{test_config, test_state, FakePayments, FakeTextProvider, ALLOWED_ORIGIN};
use gateway_service::build_router;
use std::sync::Arc;
use tower::util::ServiceExt;

fn router() -> Router {
    let config = test_config();
    let state = test_state(
        &config,
        Arc::new(FakeTextProvider::replying("Hook!")),
        Arc::new(FakePayments::default()),
    );
    build_router(state, &config.cors.allowed_origins)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn cors_test_endpoint() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/cors-test")
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ALLOWED_ORIGIN
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, serde_json::json!({ "cors": "ok" }));
}

#[tokio::test]
async fn unknown_origin_gets_no_cors_headers() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/cors-test")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn preflight_from_allowed_origin() {
    let response = router()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/generate")
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ALLOWED_ORIGIN
    );
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"));
    assert!(!methods.contains("DELETE"));
}

#[tokio::test]
async fn preflight_from_unknown_origin_is_not_allowed() {
    let response = router()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/generate")
                .header(header::ORIGIN, "https://evil.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn wake_returns_text() {
    let response = router()
        .oneshot(Request::builder().uri("/wake").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body_string(response).await.is_empty());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/wake")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn generate_via_router() {
    let response = router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"prompt":"hook about productivity"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["script"], "Hook!");
}

#[tokio::test]
async fn generate_does_not_accept_get() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn wildcard_origin_is_skipped() {
    let config = test_config();
    let state = test_state(
        &config,
        Arc::new(FakeTextProvider::replying("Hook!")),
        Arc::new(FakePayments::default()),
    );
    let origins = vec!["*".to_string(), ALLOWED_ORIGIN.to_string()];

    let response = build_router(state, &origins)
        .oneshot(
            Request::builder()
                .uri("/cors-test")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
