//! Application startup and lifecycle management.

use crate::config::{CheckoutItem, GatewayConfig, GeneratorMode, ResponseMode};
use crate::handlers;
use crate::services::providers::{
    openai::OpenAiTextProvider, stub::StubTextProvider, GenerationParams, TextProvider,
};
use crate::services::{
    init_metrics, PaymentProvider, StripeClient, StripeWebhookVerifier, WebhookVerifier,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state. Everything in it is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub text_provider: Arc<dyn TextProvider>,
    pub payments: Arc<dyn PaymentProvider>,
    pub webhook_verifier: Arc<dyn WebhookVerifier>,
    pub generation: GenerationParams,
    pub response_mode: ResponseMode,
    pub checkout_item: CheckoutItem,
}

impl AppState {
    /// Wire the real providers selected by `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, AppError> {
        let text_provider: Arc<dyn TextProvider> = match config.generator.mode {
            GeneratorMode::OpenAi => {
                let provider = OpenAiTextProvider::new(config.openai.clone())
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
                if !provider.is_configured() {
                    tracing::warn!("OpenAI API key not set - /generate will fail");
                }
                tracing::info!(model = %config.openai.model, "Initialized OpenAI text provider");
                Arc::new(provider)
            }
            GeneratorMode::Stub => {
                tracing::info!("Initialized stub text provider");
                Arc::new(StubTextProvider::new())
            }
        };

        let stripe = StripeClient::new(config.stripe.clone())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
        if stripe.is_configured() {
            tracing::info!("Stripe client initialized");
        } else {
            tracing::warn!("Stripe secret key not configured - checkout will fail");
        }

        let webhook_verifier = StripeWebhookVerifier::new(
            config.stripe.webhook_secret.clone(),
            config.stripe.webhook_tolerance_seconds,
        );
        if !webhook_verifier.is_configured() {
            tracing::warn!("Stripe webhook secret not configured - /webhook will reject all events");
        }

        Ok(Self {
            text_provider,
            payments: Arc::new(stripe),
            webhook_verifier: Arc::new(webhook_verifier),
            generation: GenerationParams {
                system_prompt: config.generator.system_prompt.clone(),
                temperature: config.generator.temperature,
            },
            response_mode: config.generator.response_mode,
            checkout_item: config.checkout.clone(),
        })
    }
}

/// CORS policy: GET/POST from the listed origins only, credentials allowed.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter(|o| {
            if o.as_str() == "*" {
                tracing::error!("Wildcard CORS origin is not allowed with credentials. Skipping.");
                return false;
            }
            true
        })
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .allow_credentials(true)
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/wake", get(handlers::wake))
        .route("/cors-test", get(handlers::cors_test))
        .route("/generate", post(handlers::generate::generate))
        .route(
            "/create-checkout-session",
            post(handlers::checkout::create_checkout_session),
        )
        .route("/webhook", post(handlers::webhook::webhook))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the providers selected by `config`.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config)?;
        Self::build_with_state(config, state).await
    }

    /// Build with caller-supplied providers.
    pub async fn build_with_state(config: GatewayConfig, state: AppState) -> Result<Self, AppError> {
        init_metrics();

        let router = build_router(state, &config.cors.allowed_origins);

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            origins = ?config.cors.allowed_origins,
            "Gateway service configured"
        );

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Server running on port {}", self.port);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
