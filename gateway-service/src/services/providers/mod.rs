//! Text generation provider abstractions and implementations.
//!
//! `/generate` talks to a [`TextProvider`] trait object so the live OpenAI
//! backend, the deterministic stub and test fakes are interchangeable.

pub mod openai;
pub mod stub;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Empty response from provider")]
    EmptyResponse,
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text.
    pub text: String,

    /// The provider's response body as received, if it has one.
    pub raw: Option<serde_json::Value>,
}

/// Fixed generation settings applied to every prompt.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Sent as the system message ahead of the prompt.
    pub system_prompt: String,

    pub temperature: f32,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
