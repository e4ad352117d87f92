//! `POST /create-checkout-session`

use axum::{extract::State, Json};
use serde::Serialize;
use service_core::error::AppError;

use crate::startup::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub id: String,
    /// Same value as `id`, for front-ends that read `sessionId`.
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Create a checkout session for the fixed catalog item. The request body is
/// ignored.
pub async fn create_checkout_session(
    State(state): State<AppState>,
) -> Result<Json<CheckoutSessionResponse>, AppError> {
    let item = &state.checkout_item;

    let session = state
        .payments
        .create_checkout_session(item)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create checkout session");
            AppError::Upstream {
                message: "Something went wrong with the payment provider.".to_string(),
                details: Some(e.to_string()),
            }
        })?;

    tracing::info!(
        session_id = %session.id,
        currency = %item.currency,
        unit_amount = item.unit_amount,
        "Checkout session created"
    );

    Ok(Json(CheckoutSessionResponse {
        session_id: session.id.clone(),
        id: session.id,
        url: session.url,
    }))
}
