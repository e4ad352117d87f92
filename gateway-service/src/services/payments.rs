//! Payment capabilities used by the checkout and webhook routes.

use crate::config::CheckoutItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use service_core::utils::signature::SignatureError;
use thiserror::Error;

/// Event type that marks a paid checkout.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment provider not configured: {0}")]
    NotConfigured(String),

    /// The provider answered with an error body.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// A provider-side pending payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page, when the provider returns one.
    pub url: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_session(
        &self,
        item: &CheckoutItem,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// Provider event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEventData {
    #[serde(default)]
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Payer email on a completed checkout session, wherever the provider put it.
    pub fn customer_email(&self) -> Option<&str> {
        let object = &self.data.object;
        object
            .get("customer_email")
            .and_then(|v| v.as_str())
            .or_else(|| {
                object
                    .get("customer_details")
                    .and_then(|d| d.get("email"))
                    .and_then(|v| v.as_str())
            })
    }

    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }

    /// The fields logged for a completed checkout; `None` for other event types.
    pub fn completed_checkout(&self) -> Option<CompletedCheckout<'_>> {
        if self.event_type != CHECKOUT_SESSION_COMPLETED {
            return None;
        }
        Some(CompletedCheckout {
            session_id: self.object_id().unwrap_or("-"),
            customer_email: self.customer_email().unwrap_or("unknown"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedCheckout<'a> {
    pub session_id: &'a str,
    pub customer_email: &'a str,
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Authenticates a raw webhook body and decodes the event.
pub trait WebhookVerifier: Send + Sync {
    fn verify(&self, payload: &[u8], signature_header: &str) -> Result<WebhookEvent, WebhookError>;
}
