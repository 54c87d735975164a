//! Payment provider seam: the gateway hosts the payment page, we only create
//! payments and react to its webhooks.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

mod http_gateway;
pub mod webhook;

pub use http_gateway::HttpPaymentGateway;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payments are not configured")]
    NotConfigured,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider api error status={status} body={body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: Uuid,
    pub invoice_number: String,
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub description: String,
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub provider_payment_id: String,
    pub status: String,
    pub confirmation_url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Name stored alongside each payment row.
    fn provider(&self) -> &str;

    async fn create_payment(&self, req: &PaymentRequest) -> Result<PaymentSession, PaymentError>;
}

/// Stand-in used when no provider URL is configured.
#[derive(Debug, Default, Clone)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    fn provider(&self) -> &str {
        "none"
    }

    async fn create_payment(&self, _req: &PaymentRequest) -> Result<PaymentSession, PaymentError> {
        Err(PaymentError::NotConfigured)
    }
}
