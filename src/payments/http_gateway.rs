use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{PaymentError, PaymentGateway, PaymentRequest, PaymentSession};

/// JSON-over-HTTP provider client authenticated with an `X-Api-Key` header.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreatePaymentBody<'a> {
    amount: i64,
    currency: &'a str,
    #[serde(rename = "orderId")]
    order_id: String,
    #[serde(rename = "invoiceNumber")]
    invoice_number: &'a str,
    description: &'a str,
    #[serde(rename = "customerEmail")]
    customer_email: &'a str,
    #[serde(rename = "returnUrl")]
    return_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    id: String,
    status: String,
    #[serde(rename = "confirmationUrl", alias = "paymentUrl")]
    confirmation_url: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    fn provider(&self) -> &str {
        "http"
    }

    async fn create_payment(&self, req: &PaymentRequest) -> Result<PaymentSession, PaymentError> {
        let body = CreatePaymentBody {
            amount: req.amount,
            currency: &req.currency,
            order_id: req.order_id.to_string(),
            invoice_number: &req.invoice_number,
            description: &req.description,
            customer_email: &req.customer_email,
            return_url: &req.return_url,
        };

        let resp = self
            .client
            .post(format!("{}/payments", self.base_url))
            .header("X-Api-Key", &self.api_key)
            // Retrying the same order must not create a second charge.
            .header("Idempotency-Key", req.order_id.to_string())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed = serde_json::from_str::<CreatePaymentResponse>(&text)
            .map_err(|e| PaymentError::InvalidResponse(format!("{e}; body={text}")))?;

        Ok(PaymentSession {
            provider_payment_id: parsed.id,
            status: parsed.status,
            confirmation_url: parsed.confirmation_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_response_accepts_payment_url_alias() {
        let parsed: CreatePaymentResponse = serde_json::from_str(
            r#"{"id":"pay_9","status":"pending","paymentUrl":"https://pay.test/9"}"#,
        )
        .unwrap();
        assert_eq!(parsed.id, "pay_9");
        assert_eq!(parsed.confirmation_url.as_deref(), Some("https://pay.test/9"));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let gateway = HttpPaymentGateway::new("https://api.pay.test/v1/", "key");
        assert_eq!(gateway.base_url, "https://api.pay.test/v1");
    }
}
