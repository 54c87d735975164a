use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    /// Where the provider sends the customer afterwards.
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentInitiation {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub provider_payment_id: String,
    pub confirmation_url: Option<String>,
    pub status: String,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct WebhookAck {
    pub ok: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub idempotent: bool,
    /// Money was captured for an order that is already cancelled.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub refund_required: bool,
}
