use axum::http::HeaderMap;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
    ActiveValue::NotSet,
    sea_query::{LockType, OnConflict},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    dto::payments::{InitiatePaymentRequest, PaymentInitiation, WebhookAck},
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    payments::{
        PaymentRequest,
        webhook::{self, WebhookOutcome},
    },
    response::{ApiResponse, Meta},
    state::AppState,
    status::{OrderStatus, PaymentStatus},
};

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_SUCCEEDED: &str = "succeeded";
pub const PAYMENT_FAILED: &str = "failed";

pub async fn initiate_payment(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: InitiatePaymentRequest,
) -> AppResult<ApiResponse<PaymentInitiation>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    ensure_payable(&order)?;

    let settings = &state.config.payment;
    let return_url = payload
        .return_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| settings.return_url.clone());

    let request = PaymentRequest {
        order_id: order.id,
        invoice_number: order.invoice_number.clone(),
        amount: order.total_amount,
        currency: settings.currency.clone(),
        customer_email: order.customer_email.clone(),
        description: format!("Order {}", order.invoice_number),
        return_url,
    };

    let session = state.payments.create_payment(&request).await?;
    tracing::info!(
        order_id = %order.id,
        provider_payment_id = %session.provider_payment_id,
        "payment created"
    );

    let txn = state.orm.begin().await?;

    // A webhook may have settled the order while the provider was called.
    let order = Orders::find_by_id(order.id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_payable(&order)?;

    let now = Utc::now();
    // The provider may hand back the same payment for a repeated idempotency key.
    let payment = Payments::insert(PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        provider: Set(state.payments.provider().to_string()),
        provider_payment_id: Set(session.provider_payment_id.clone()),
        amount: Set(request.amount),
        currency: Set(request.currency.clone()),
        status: Set(PAYMENT_PENDING.into()),
        confirmation_url: Set(session.confirmation_url.clone()),
        created_at: NotSet,
        updated_at: Set(now.into()),
    })
    .on_conflict(
        OnConflict::column(PaymentCol::ProviderPaymentId)
            .update_columns([PaymentCol::ConfirmationUrl, PaymentCol::UpdatedAt])
            .to_owned(),
    )
    .exec_with_returning(&txn)
    .await?;
    let payment_id = payment.id;

    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Pending.as_str().into());
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_initiate",
        "payments",
        serde_json::json!({
            "order_id": order.id,
            "payment_id": payment_id,
            "amount": request.amount,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment created",
        PaymentInitiation {
            payment_id,
            order_id: order.id,
            provider_payment_id: session.provider_payment_id,
            confirmation_url: session.confirmation_url,
            status: session.status,
        },
        Some(Meta::empty()),
    ))
}

pub async fn handle_webhook(
    state: &AppState,
    headers: &HeaderMap,
    payload: Value,
) -> AppResult<WebhookAck> {
    let expected = state.config.payment.webhook_secret.as_str();
    let provided = webhook::extract_api_key(headers, &payload);
    if expected.is_empty() || provided.as_deref() != Some(expected) {
        tracing::warn!("payment webhook rejected: bad api key");
        return Err(AppError::Unauthorized("Invalid webhook key".into()));
    }

    let event = webhook::normalize(&payload);
    let Some(provider_payment_id) = event.payment_id.clone() else {
        return Err(AppError::BadRequest("payment_id is required".into()));
    };

    if event.outcome == WebhookOutcome::Unknown {
        tracing::debug!(%provider_payment_id, status = ?event.status, "webhook status ignored");
        return Ok(WebhookAck {
            ok: true,
            ignored: true,
            ..Default::default()
        });
    }

    let txn = state.orm.begin().await?;

    let Some(payment) = Payments::find()
        .filter(PaymentCol::ProviderPaymentId.eq(provider_payment_id.as_str()))
        .lock(LockType::Update)
        .one(&txn)
        .await?
    else {
        tracing::warn!(%provider_payment_id, "webhook for unknown payment");
        return Ok(WebhookAck {
            ok: true,
            ignored: true,
            ..Default::default()
        });
    };

    if payment.status == PAYMENT_SUCCEEDED || payment.status == PAYMENT_FAILED {
        return Ok(WebhookAck {
            ok: true,
            idempotent: true,
            ..Default::default()
        });
    }

    let order = Orders::find_by_id(payment.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let order_id = order.id;
    let payment_status = match event.outcome {
        WebhookOutcome::Succeeded => PAYMENT_SUCCEEDED,
        _ => PAYMENT_FAILED,
    };

    let mut payment_active: PaymentActive = payment.into();
    payment_active.status = Set(payment_status.into());
    payment_active.updated_at = Set(now.into());
    payment_active.update(&txn).await?;

    // A cancelled order has already released its stock; the capture is only
    // recorded on the payment and flagged for refund.
    let refund_required = event.outcome == WebhookOutcome::Succeeded
        && order.status == OrderStatus::Cancelled.as_str();

    let mut order_active: OrderActive = order.clone().into();
    match event.outcome {
        WebhookOutcome::Succeeded if refund_required => {}
        WebhookOutcome::Succeeded => {
            if order.status == OrderStatus::Pending.as_str() {
                order_active.status = Set(OrderStatus::Paid.as_str().into());
            }
            order_active.payment_status = Set(PaymentStatus::Paid.as_str().into());
            order_active.paid_at = Set(Some(now.into()));
        }
        _ => {
            if order.payment_status != PaymentStatus::Paid.as_str() {
                order_active.payment_status = Set(PaymentStatus::Failed.as_str().into());
            }
        }
    }
    order_active.updated_at = Set(now.into());
    order_active.update(&txn).await?;

    txn.commit().await?;

    let action = if refund_required {
        tracing::warn!(%order_id, %provider_payment_id, "payment captured for cancelled order, refund required");
        "payment_refund_required"
    } else {
        tracing::info!(%order_id, %provider_payment_id, payment_status, "payment webhook applied");
        "payment_webhook"
    };
    audit::record(
        &state.pool,
        None,
        action,
        "payments",
        serde_json::json!({
            "order_id": order_id,
            "provider_payment_id": provider_payment_id,
            "status": payment_status,
        }),
    )
    .await;

    Ok(WebhookAck {
        ok: true,
        refund_required,
        ..Default::default()
    })
}

fn ensure_payable(order: &OrderModel) -> AppResult<()> {
    if order.status != OrderStatus::Pending.as_str() {
        return Err(AppError::BadRequest(format!(
            "Order is {} and cannot be paid",
            order.status
        )));
    }
    if order.payment_status == PaymentStatus::Paid.as_str() {
        return Err(AppError::BadRequest("Order is already paid".into()));
    }
    Ok(())
}
