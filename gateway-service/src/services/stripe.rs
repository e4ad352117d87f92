//! Stripe Checkout client and webhook verification.
//!
//! Sessions are created through the form-encoded `/v1/checkout/sessions`
//! endpoint. Webhooks carry a `Stripe-Signature` header that is checked with
//! the shared endpoint secret before the body is decoded.

use crate::config::{CheckoutItem, StripeConfig};
use crate::services::payments::{
    CheckoutSession, PaymentError, PaymentProvider, WebhookError, WebhookEvent, WebhookVerifier,
};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::utils::signature::verify_signature_header;
use std::time::Duration;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Stripe client for interacting with the Stripe API.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

/// Stripe API error response.
#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PaymentError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Check if Stripe is configured (secret key is set).
    pub fn is_configured(&self) -> bool {
        !self.config.secret_key.expose_secret().is_empty()
    }

    /// Form fields for a one-item payment-mode session.
    pub fn session_form(item: &CheckoutItem) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            (
                "line_items[0][price_data][currency]",
                item.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                item.product_name.clone(),
            ),
            (
                "line_items[0][price_data][product_data][description]",
                item.product_description.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                item.unit_amount.to_string(),
            ),
            ("line_items[0][quantity]", item.quantity.to_string()),
            ("success_url", item.success_url.clone()),
            ("cancel_url", item.cancel_url.clone()),
        ]
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        item: &CheckoutItem,
    ) -> Result<CheckoutSession, PaymentError> {
        if !self.is_configured() {
            return Err(PaymentError::NotConfigured(
                "Stripe secret key not set".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/checkout/sessions",
            self.config.api_base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&Self::session_form(item))
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        tracing::debug!(status = %status, "Stripe create_checkout_session response");

        if status.is_success() {
            let session: CheckoutSession = serde_json::from_str(&body)
                .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;
            if session.id.is_empty() {
                return Err(PaymentError::InvalidResponse(
                    "session id missing".to_string(),
                ));
            }
            tracing::info!(
                session_id = %session.id,
                amount = item.unit_amount,
                currency = %item.currency,
                "Stripe checkout session created"
            );
            Ok(session)
        } else {
            let detail = serde_json::from_str::<StripeErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(StripeErrorDetail {
                    error_type: None,
                    code: None,
                    message: Some(body.clone()),
                });
            let code = detail
                .code
                .or(detail.error_type)
                .unwrap_or_else(|| status.as_u16().to_string());
            let message = detail.message.unwrap_or_default();
            tracing::error!(
                code = %code,
                message = %message,
                "Stripe checkout session creation failed"
            );
            Err(PaymentError::Api { code, message })
        }
    }
}

/// Verifies `Stripe-Signature` headers against the endpoint secret.
pub struct StripeWebhookVerifier {
    secret: Secret<String>,
    tolerance_seconds: u64,
}

impl StripeWebhookVerifier {
    pub fn new(secret: Secret<String>, tolerance_seconds: u64) -> Self {
        Self {
            secret,
            tolerance_seconds,
        }
    }

    /// Without a secret every webhook is rejected.
    pub fn is_configured(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }

    /// Verify as of `now` (unix seconds).
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError> {
        verify_signature_header(
            self.secret.expose_secret(),
            payload,
            signature_header,
            self.tolerance_seconds,
            now,
        )?;

        serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }
}

impl WebhookVerifier for StripeWebhookVerifier {
    fn verify(&self, payload: &[u8], signature_header: &str) -> Result<WebhookEvent, WebhookError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }
}
