use axum::http::HeaderMap;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Succeeded,
    Failed,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub outcome: WebhookOutcome,
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub fn classify(status: Option<&str>) -> WebhookOutcome {
    let Some(status) = status else {
        return WebhookOutcome::Unknown;
    };
    // Providers report either a bare status or a dotted event name.
    let status = status.rsplit('.').next().unwrap_or(status).to_ascii_lowercase();
    match status.as_str() {
        "succeeded" | "success" | "paid" | "completed" => WebhookOutcome::Succeeded,
        "failed" | "fail" | "canceled" | "cancelled" | "declined" => WebhookOutcome::Failed,
        _ => WebhookOutcome::Unknown,
    }
}

/// Accept the payload shapes providers commonly send: a flat object, or one
/// with the payment nested under `object`.
pub fn normalize(raw: &Value) -> WebhookEvent {
    let body = raw.get("object").filter(|v| v.is_object()).unwrap_or(raw);

    let payment_id = string_field(body, &["payment_id", "paymentId", "id"])
        .or_else(|| string_field(raw, &["payment_id", "paymentId"]));
    let status = string_field(body, &["status"]).or_else(|| string_field(raw, &["event", "eventType"]));

    WebhookEvent {
        outcome: classify(status.as_deref()),
        payment_id,
        status,
    }
}

/// Shared secret from the `X-Api-Key` header, falling back to an `api_key`
/// field in the body.
pub fn extract_api_key(headers: &HeaderMap, payload: &Value) -> Option<String> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .or_else(|| string_field(payload, &["api_key"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_payload_is_normalized() {
        let event = normalize(&json!({ "payment_id": "pay_1", "status": "succeeded" }));
        assert_eq!(event.payment_id.as_deref(), Some("pay_1"));
        assert_eq!(event.outcome, WebhookOutcome::Succeeded);
    }

    #[test]
    fn nested_object_payload_is_normalized() {
        let event = normalize(&json!({
            "event": "payment.canceled",
            "object": { "id": "pay_2", "status": "canceled" }
        }));
        assert_eq!(event.payment_id.as_deref(), Some("pay_2"));
        assert_eq!(event.outcome, WebhookOutcome::Failed);
    }

    #[test]
    fn event_name_is_used_when_status_missing() {
        let event = normalize(&json!({ "paymentId": "pay_3", "event": "payment.succeeded" }));
        assert_eq!(event.outcome, WebhookOutcome::Succeeded);
    }

    #[test]
    fn unknown_status_is_not_acted_on() {
        assert_eq!(classify(Some("waiting_for_capture")), WebhookOutcome::Unknown);
        assert_eq!(classify(None), WebhookOutcome::Unknown);
    }

    #[test]
    fn api_key_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", "from-header".parse().unwrap());
        let payload = json!({ "api_key": "from-body" });
        assert_eq!(extract_api_key(&headers, &payload).as_deref(), Some("from-header"));
        assert_eq!(
            extract_api_key(&HeaderMap::new(), &payload).as_deref(),
            Some("from-body")
        );
    }
}
