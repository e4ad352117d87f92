//! `POST /webhook`
//!
//! Takes the body as raw bytes; the signature covers the exact bytes sent.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use service_core::error::AppError;
use service_core::utils::signature::SignatureError;

use crate::services::payments::WebhookError;
use crate::services::stripe::SIGNATURE_HEADER;
use crate::startup::AppState;

pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing {} header", SIGNATURE_HEADER);
            AppError::Webhook(SignatureError::MissingHeader.to_string())
        })?;

    let event = state
        .webhook_verifier
        .verify(&body, signature)
        .map_err(|e: WebhookError| {
            tracing::warn!(error = %e, "Webhook rejected");
            AppError::Webhook(e.to_string())
        })?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        "Webhook verified"
    );

    if let Some(checkout) = event.completed_checkout() {
        tracing::info!(
            session_id = checkout.session_id,
            customer_email = checkout.customer_email,
            "Payment completed"
        );
    } else {
        tracing::debug!(event_type = %event.event_type, "Ignoring webhook event type");
    }

    Ok(StatusCode::OK)
}
