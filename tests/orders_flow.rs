mod common;

use axum::http::HeaderMap;
use storefront_api::{
    dto::{
        admin::{InventoryAdjustRequest, UpdateOrderStatusRequest},
        basket::AddToBasketRequest,
        orders::CheckoutRequest,
        payments::InitiatePaymentRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{LowStockQuery, Pagination},
    services::{admin_service, basket_service, order_service, payment_service},
    state::AppState,
};
use uuid::Uuid;

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "Test Customer".into(),
        customer_email: "customer@example.com".into(),
        customer_phone: "+1 555 0100".into(),
        shipping_address: "1 Main St".into(),
        shipping_city: "Springfield".into(),
        shipping_postal_code: "12345".into(),
        shipping_country: "US".into(),
        comment: Some("Leave at the door".into()),
    }
}

async fn add(state: &AppState, user: &AuthUser, product_id: Uuid, quantity: i32) -> Result<(), AppError> {
    basket_service::add_to_basket(state, user, AddToBasketRequest { product_id, quantity })
        .await
        .map(|_| ())
}

fn webhook_headers(key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", key.parse().unwrap());
    headers
}

// basket -> checkout -> payment -> webhook -> admin fulfilment and low stock.
#[tokio::test]
async fn checkout_pay_and_fulfil_flow() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let user = common::create_user(state, "user", true).await?;
    let admin = common::create_user(state, "admin", true).await?;
    let product = common::create_product(state, 1000, 10, 10).await?;

    add(state, &user, product.id, 2).await?;
    add(state, &user, product.id, 1).await?;

    let basket = basket_service::list_basket(state, &user, Pagination::default())
        .await?
        .data
        .unwrap();
    assert_eq!(basket.items.len(), 1);
    assert_eq!(basket.total_quantity, 3);
    assert_eq!(basket.total_amount, 2700);

    let over = add(state, &user, product.id, 8).await;
    assert!(matches!(over, Err(AppError::BadRequest(_))), "stock must cap the basket");

    let placed = order_service::checkout(state, &user, checkout_request())
        .await?
        .data
        .unwrap();
    assert_eq!(placed.order.total_amount, 2700);
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.payment_status, "unpaid");
    assert!(placed.order.invoice_number.starts_with("INV-"));
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].price, 900);
    assert_eq!(placed.items[0].product_name, product.name);

    let basket = basket_service::list_basket(state, &user, Pagination::default())
        .await?
        .data
        .unwrap();
    assert!(basket.items.is_empty(), "checkout clears the basket");

    let empty = order_service::checkout(state, &user, checkout_request()).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let order_id = placed.order.id;
    let initiation = payment_service::initiate_payment(
        state,
        &user,
        order_id,
        InitiatePaymentRequest::default(),
    )
    .await?
    .data
    .unwrap();
    assert!(initiation.confirmation_url.is_some());
    {
        let requests = app.gateway.requests.lock().unwrap();
        let sent = requests.last().expect("gateway called");
        assert_eq!(sent.amount, 2700);
        assert_eq!(sent.currency, "USD");
        assert_eq!(sent.return_url, "http://localhost:3000/thanks");
    }

    let event = serde_json::json!({
        "payment_id": initiation.provider_payment_id,
        "status": "succeeded",
    });

    let rejected =
        payment_service::handle_webhook(state, &webhook_headers("wrong"), event.clone()).await;
    assert!(matches!(rejected, Err(AppError::Unauthorized(_))));

    let headers = webhook_headers(common::WEBHOOK_SECRET);
    let ack = payment_service::handle_webhook(state, &headers, event.clone()).await?;
    assert!(ack.ok && !ack.ignored && !ack.idempotent);

    let replay = payment_service::handle_webhook(state, &headers, event).await?;
    assert!(replay.idempotent);

    let unknown = payment_service::handle_webhook(
        state,
        &headers,
        serde_json::json!({ "payment_id": "nope", "status": "succeeded" }),
    )
    .await?;
    assert!(unknown.ignored);

    let paid = order_service::get_order(state, &user, order_id).await?.data.unwrap();
    assert_eq!(paid.order.status, "paid");
    assert_eq!(paid.order.payment_status, "paid");
    assert!(paid.order.paid_at.is_some());

    let again = payment_service::initiate_payment(
        state,
        &user,
        order_id,
        InitiatePaymentRequest::default(),
    )
    .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    let stranger = common::create_user(state, "user", true).await?;
    let hidden = order_service::get_order(state, &stranger, order_id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    let forbidden = admin_service::update_order_status(
        state,
        &user,
        order_id,
        UpdateOrderStatusRequest { status: "shipped".into() },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let shipped = admin_service::update_order_status(
        state,
        &admin,
        order_id,
        UpdateOrderStatusRequest { status: "shipped".into() },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(shipped.status, "shipped");

    let backwards = admin_service::update_order_status(
        state,
        &admin,
        order_id,
        UpdateOrderStatusRequest { status: "pending".into() },
    )
    .await;
    assert!(matches!(backwards, Err(AppError::BadRequest(_))));

    let low = admin_service::list_low_stock(
        state,
        &admin,
        LowStockQuery {
            threshold: Some(7),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    let listed = low
        .items
        .iter()
        .find(|p| p.id == product.id)
        .expect("product below threshold after checkout");
    assert_eq!(listed.stock_quantity, 7);

    let restocked = admin_service::adjust_inventory(
        state,
        &admin,
        product.id,
        InventoryAdjustRequest { delta: 5 },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(restocked.stock_quantity, 12);

    let negative = admin_service::adjust_inventory(
        state,
        &admin,
        product.id,
        InventoryAdjustRequest { delta: -100 },
    )
    .await;
    assert!(matches!(negative, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn unverified_users_cannot_check_out() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let user = common::create_user(state, "user", false).await?;
    let product = common::create_product(state, 500, 0, 3).await?;
    add(state, &user, product.id, 1).await?;

    let result = order_service::checkout(state, &user, checkout_request()).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn cancelling_restores_stock_and_failed_payment_keeps_order_open() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let user = common::create_user(state, "user", true).await?;
    let product = common::create_product(state, 2000, 0, 5).await?;
    add(state, &user, product.id, 4).await?;

    let placed = order_service::checkout(state, &user, checkout_request())
        .await?
        .data
        .unwrap();

    let initiation = payment_service::initiate_payment(
        state,
        &user,
        placed.order.id,
        InitiatePaymentRequest::default(),
    )
    .await?
    .data
    .unwrap();

    let headers = webhook_headers(common::WEBHOOK_SECRET);
    payment_service::handle_webhook(
        state,
        &headers,
        serde_json::json!({
            "event": "payment.canceled",
            "object": { "id": initiation.provider_payment_id, "status": "canceled" }
        }),
    )
    .await?;

    let failed = order_service::get_order(state, &user, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(failed.order.status, "pending");
    assert_eq!(failed.order.payment_status, "failed");

    let cancelled = order_service::cancel_order(state, &user, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.order.status, "cancelled");

    // Back to 5 in stock, so the whole lot fits in a new basket.
    add(state, &user, product.id, 5).await?;

    let twice = order_service::cancel_order(state, &user, placed.order.id).await;
    assert!(matches!(twice, Err(AppError::BadRequest(_))));
    Ok(())
}
