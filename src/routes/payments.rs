use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use serde_json::Value;

use crate::{
    dto::payments::WebhookAck, error::AppResult, services::payment_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(payment_webhook))
}

/// Provider callback. Authenticated by the shared `X-Api-Key` secret rather
/// than a user token, and answered with a bare ack instead of the envelope.
#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    params(("X-Api-Key" = String, Header, description = "Webhook secret")),
    responses(
        (status = 200, description = "Event processed, ignored or already applied", body = WebhookAck),
        (status = 400, description = "payment_id missing"),
        (status = 401, description = "Bad webhook secret")
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> AppResult<Json<WebhookAck>> {
    let ack = payment_service::handle_webhook(&state, &headers, payload).await?;
    Ok(Json(ack))
}
