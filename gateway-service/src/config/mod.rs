use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

const DEFAULT_ALLOWED_ORIGINS: &str =
    "https://copy-boss.com,https://www.copy-boss.com,https://copyboss.onrender.com";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub generator: GeneratorConfig,
    pub openai: OpenAiConfig,
    pub stripe: StripeConfig,
    pub checkout: CheckoutItem,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub mode: GeneratorMode,
    pub response_mode: ResponseMode,
    /// Fixed persona sent as the system message.
    pub system_prompt: String,
    pub temperature: f32,
}

/// Which text provider backs `/generate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    OpenAi,
    Stub,
}

impl FromStr for GeneratorMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "live" => Ok(GeneratorMode::OpenAi),
            "stub" => Ok(GeneratorMode::Stub),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown generator mode '{}', expected 'openai' or 'stub'",
                other
            ))),
        }
    }
}

/// Shape of a successful `/generate` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// `{ "script": "..." }`
    Script,
    /// The provider's completion object as received, when it has one.
    Passthrough,
}

impl FromStr for ResponseMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "script" => Ok(ResponseMode::Script),
            "passthrough" => Ok(ResponseMode::Passthrough),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown response mode '{}', expected 'script' or 'passthrough'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub api_base_url: String,
    /// Maximum age of a webhook signature timestamp. 0 disables the check.
    pub webhook_tolerance_seconds: u64,
    pub timeout_seconds: u64,
}

/// The single catalog item sold through checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutItem {
    pub product_name: String,
    pub product_description: String,
    pub currency: String,
    /// Price in the currency's minor unit (pence for GBP).
    pub unit_amount: u64,
    pub quantity: u32,
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for CheckoutItem {
    fn default() -> Self {
        Self {
            product_name: "Unlimited Script Generator + Bonus Tools".to_string(),
            product_description:
                "Lifetime access to viral script generator, hashtag tool, and bonuses."
                    .to_string(),
            currency: "gbp".to_string(),
            unit_amount: 199,
            quantity: 1,
            success_url: "http://copy-boss.com/success.html".to_string(),
            cancel_url: "http://copy-boss.com/cancel.html".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let timeout_seconds = parse_env("UPSTREAM_TIMEOUT_SECONDS", Some("60"), is_prod)?;

        let generator = GeneratorConfig {
            mode: get_env("GENERATOR_MODE", Some("openai"), is_prod)?.parse()?,
            response_mode: get_env("GENERATE_RESPONSE_MODE", Some("script"), is_prod)?.parse()?,
            system_prompt: "You are a social media script expert.".to_string(),
            temperature: 0.7,
        };

        // The key is only needed when the live provider is selected.
        let openai_key_default = match generator.mode {
            GeneratorMode::OpenAi => None,
            GeneratorMode::Stub => Some(""),
        };

        let defaults = CheckoutItem::default();

        Ok(GatewayConfig {
            common: common_config,
            openai: OpenAiConfig {
                api_key: Secret::new(get_env("OPENAI_API_KEY", openai_key_default, false)?),
                model: get_env("OPENAI_MODEL", Some("gpt-4o"), is_prod)?,
                api_base_url: get_env(
                    "OPENAI_API_BASE",
                    Some("https://api.openai.com/v1"),
                    is_prod,
                )?,
                timeout_seconds,
            },
            generator,
            stripe: StripeConfig {
                secret_key: Secret::new(get_env("STRIPE_SECRET_KEY", None, is_prod)?),
                webhook_secret: Secret::new(get_env("STRIPE_WEBHOOK_SECRET", None, is_prod)?),
                api_base_url: get_env("STRIPE_API_BASE", Some("https://api.stripe.com"), is_prod)?,
                webhook_tolerance_seconds: parse_env(
                    "STRIPE_WEBHOOK_TOLERANCE_SECONDS",
                    Some("300"),
                    is_prod,
                )?,
                timeout_seconds,
            },
            checkout: CheckoutItem {
                success_url: get_env("CHECKOUT_SUCCESS_URL", Some(defaults.success_url.as_str()), is_prod)?,
                cancel_url: get_env("CHECKOUT_CANCEL_URL", Some(defaults.cancel_url.as_str()), is_prod)?,
                ..defaults
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env(
                    "CORS_ALLOWED_ORIGINS",
                    Some(DEFAULT_ALLOWED_ORIGINS),
                    is_prod,
                )?)?,
            },
        })
    }
}

/// Credentialed CORS cannot use a wildcard, so `*` is a configuration error.
fn parse_origins(raw: &str) -> Result<Vec<String>, AppError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| o.trim_end_matches('/').to_string())
        .collect();

    if origins.iter().any(|o| o == "*") {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "CORS_ALLOWED_ORIGINS must list explicit origins, not '*'"
        )));
    }

    Ok(origins)
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?.parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
    })
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
