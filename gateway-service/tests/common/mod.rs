#![allow(dead_code)]

use async_trait::async_trait;
use gateway_service::config::{
    CheckoutItem, CorsConfig, GatewayConfig, GeneratorConfig, GeneratorMode, OpenAiConfig,
    ResponseMode, StripeConfig,
};
use gateway_service::services::payments::{CheckoutSession, PaymentError, PaymentProvider};
use gateway_service::services::providers::{
    GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use gateway_service::services::StripeWebhookVerifier;
use gateway_service::{AppState, Application};
use secrecy::Secret;
use service_core::config as core_config;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const WEBHOOK_SECRET: &str = "whsec_test123secret456";
pub const ALLOWED_ORIGIN: &str = "https://copy-boss.com";

/// Text provider that answers with a canned reply, or fails when it has none.
#[derive(Default)]
pub struct FakeTextProvider {
    reply: Option<String>,
    raw: Option<serde_json::Value>,
    pub prompts: Mutex<Vec<String>>,
    pub params: Mutex<Vec<GenerationParams>>,
}

impl FakeTextProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TextProvider for FakeTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.params.lock().unwrap().push(params.clone());

        match &self.reply {
            Some(text) => Ok(ProviderResponse {
                text: text.clone(),
                raw: self.raw.clone(),
            }),
            None => Err(ProviderError::ApiError(
                "upstream exploded: sk-secret-detail".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Payment provider that hands out sequential session ids.
#[derive(Default)]
pub struct FakePayments {
    fail: bool,
    counter: AtomicUsize,
    pub items: Mutex<Vec<CheckoutItem>>,
}

impl FakePayments {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_checkout_session(
        &self,
        item: &CheckoutItem,
    ) -> Result<CheckoutSession, PaymentError> {
        self.items.lock().unwrap().push(item.clone());

        if self.fail {
            return Err(PaymentError::Api {
                code: "card_declined".to_string(),
                message: "Your card was declined.".to_string(),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSession {
            id: format!("cs_test_{}", n),
            url: Some(format!("https://checkout.stripe.com/c/pay/cs_test_{}", n)),
        })
    }
}

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        common: core_config::Config { port: 0 },
        generator: GeneratorConfig {
            mode: GeneratorMode::Stub,
            response_mode: ResponseMode::Script,
            system_prompt: "You are a social media script expert.".to_string(),
            temperature: 0.7,
        },
        openai: OpenAiConfig {
            api_key: Secret::new(String::new()),
            model: "gpt-4o".to_string(),
            api_base_url: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 5,
        },
        stripe: StripeConfig {
            secret_key: Secret::new("sk_test_xxx".to_string()),
            webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
            api_base_url: "http://127.0.0.1:1".to_string(),
            webhook_tolerance_seconds: 300,
            timeout_seconds: 5,
        },
        checkout: CheckoutItem::default(),
        cors: CorsConfig {
            allowed_origins: vec![
                ALLOWED_ORIGIN.to_string(),
                "https://www.copy-boss.com".to_string(),
            ],
        },
    }
}

pub fn test_state(
    config: &GatewayConfig,
    text_provider: Arc<dyn TextProvider>,
    payments: Arc<dyn PaymentProvider>,
) -> AppState {
    AppState {
        text_provider,
        payments,
        webhook_verifier: Arc::new(StripeWebhookVerifier::new(
            config.stripe.webhook_secret.clone(),
            config.stripe.webhook_tolerance_seconds,
        )),
        generation: GenerationParams {
            system_prompt: config.generator.system_prompt.clone(),
            temperature: config.generator.temperature,
        },
        response_mode: config.generator.response_mode,
        checkout_item: config.checkout.clone(),
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn with the default fakes.
    pub async fn spawn() -> Self {
        Self::spawn_with(
            Arc::new(FakeTextProvider::replying("Stop scrolling! Here's your hook.")),
            Arc::new(FakePayments::default()),
        )
        .await
    }

    pub async fn spawn_with(
        text_provider: Arc<dyn TextProvider>,
        payments: Arc<dyn PaymentProvider>,
    ) -> Self {
        let config = test_config();
        let state = test_state(&config, text_provider, payments);
        Self::spawn_with_state(config, state).await
    }

    pub async fn spawn_with_state(config: GatewayConfig, state: AppState) -> Self {
        let app = Application::build_with_state(config, state)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}
