pub mod metrics;
pub mod payments;
pub mod providers;
pub mod stripe;

pub use metrics::{get_metrics, init_metrics};
pub use payments::{PaymentProvider, WebhookVerifier};
pub use providers::TextProvider;
pub use stripe::{StripeClient, StripeWebhookVerifier};
