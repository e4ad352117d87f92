//! HTTP handlers for gateway-service.

pub mod checkout;
pub mod generate;
pub mod webhook;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::get_metrics;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "gateway-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Keep-alive probe for hosts that idle the process.
pub async fn wake() -> &'static str {
    "Server is awake"
}

pub async fn cors_test() -> impl IntoResponse {
    Json(json!({ "cors": "ok" }))
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
