use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        basket_items::{Column as BasketCol, Entity as BasketItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::auth_service::normalize_email,
    state::AppState,
    status::{OrderStatus, PaymentStatus, ProductStatus},
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let payload = validate_checkout(payload)?;

    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !account.email_verified {
        return Err(AppError::Forbidden);
    }

    let txn = state.orm.begin().await?;

    let lines = BasketItems::find()
        .filter(BasketCol::UserId.eq(user.user_id))
        .order_by_asc(BasketCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("Basket is empty".into()));
    }

    // Lock in id order so concurrent checkouts cannot deadlock.
    let product_ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut total_amount: i64 = 0;
    let mut priced = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = products
            .get(&line.product_id)
            .filter(|p| p.status == ProductStatus::Active.as_str())
            .ok_or_else(|| {
                AppError::BadRequest(format!("Product {} is no longer available", line.product_id))
            })?;
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Basket has invalid quantity".into()));
        }
        if product.stock_quantity < line.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                product.name
            )));
        }
        let unit_price = pricing::final_price(product.price, product.discount_percent);
        total_amount = total_amount
            .checked_add(pricing::line_total(unit_price, line.quantity))
            .filter(|total| *total < i64::MAX)
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;
        priced.push((product, line.quantity, unit_price));
    }

    let order_id = Uuid::new_v4();
    let now = Utc::now();

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        customer_name: Set(payload.customer_name),
        customer_email: Set(payload.customer_email),
        customer_phone: Set(payload.customer_phone),
        shipping_address: Set(payload.shipping_address),
        shipping_city: Set(payload.shipping_city),
        shipping_postal_code: Set(payload.shipping_postal_code),
        shipping_country: Set(payload.shipping_country),
        comment: Set(payload.comment),
        status: Set(OrderStatus::Pending.as_str().into()),
        payment_status: Set(PaymentStatus::Unpaid.as_str().into()),
        total_amount: Set(total_amount),
        invoice_number: Set(build_invoice_number(order_id, now)),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(priced.len());

    for (product, quantity, unit_price) in priced {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            product_name: Set(product.name.clone()),
            quantity: Set(quantity),
            price: Set(unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        order_items.push(OrderItem::from(item));

        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(quantity),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    // Only the lines that were ordered; anything added meanwhile stays.
    let ordered_lines: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
    BasketItems::delete_many()
        .filter(BasketCol::UserId.eq(user.user_id))
        .filter(BasketCol::Id.is_in(ordered_lines))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, total_amount, "order placed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_status == PaymentStatus::Paid.as_str() {
        return Err(AppError::BadRequest("Paid orders cannot be cancelled".into()));
    }
    let order = apply_status_change(&txn, order, OrderStatus::Cancelled).await?;
    let items = load_items(&txn, order.id).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Move an order (already locked by the caller) to `next`, enforcing the
/// lifecycle. Cancelling returns stock; marking paid records payment.
pub(crate) async fn apply_status_change(
    txn: &DatabaseTransaction,
    order: OrderModel,
    next: OrderStatus,
) -> AppResult<OrderModel> {
    let current: OrderStatus = order.status.parse()?;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {current} to {next}"
        )));
    }

    if next == OrderStatus::Cancelled {
        restock(txn, order.id).await?;
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().into());
    if next == OrderStatus::Paid {
        active.payment_status = Set(PaymentStatus::Paid.as_str().into());
        active.paid_at = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    Ok(active.update(txn).await?)
}

async fn restock(txn: &DatabaseTransaction, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?;

    for item in items {
        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).add(item.quantity),
            )
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(txn)
            .await?;
    }
    Ok(())
}

pub(crate) async fn load_items<C: sea_orm::ConnectionTrait>(
    db: &C,
    order_id: Uuid,
) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect())
}

fn validate_checkout(payload: CheckoutRequest) -> AppResult<CheckoutRequest> {
    fn required(field: &str, value: String) -> AppResult<String> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
        Ok(value)
    }

    Ok(CheckoutRequest {
        customer_name: required("customer_name", payload.customer_name)?,
        customer_email: normalize_email(&payload.customer_email)?,
        customer_phone: required("customer_phone", payload.customer_phone)?,
        shipping_address: required("shipping_address", payload.shipping_address)?,
        shipping_city: required("shipping_city", payload.shipping_city)?,
        shipping_postal_code: required("shipping_postal_code", payload.shipping_postal_code)?,
        shipping_country: required("shipping_country", payload.shipping_country)?,
        comment: payload
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    })
}

fn build_invoice_number(order_id: Uuid, at: chrono::DateTime<Utc>) -> String {
    let date = at.format("%Y%m%d");
    let suffix = order_id.simple().to_string();
    format!("INV-{}-{}", date, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            customer_name: " Jane Doe ".into(),
            customer_email: "Jane@Example.com".into(),
            customer_phone: "+1 555 0100".into(),
            shipping_address: "1 Main St".into(),
            shipping_city: "Springfield".into(),
            shipping_postal_code: "12345".into(),
            shipping_country: "US".into(),
            comment: Some("   ".into()),
        }
    }

    #[test]
    fn checkout_fields_are_trimmed() {
        let checked = validate_checkout(request()).unwrap();
        assert_eq!(checked.customer_name, "Jane Doe");
        assert_eq!(checked.customer_email, "jane@example.com");
        assert_eq!(checked.comment, None);
    }

    #[test]
    fn blank_shipping_field_is_rejected() {
        let mut req = request();
        req.shipping_city = "  ".into();
        let err = validate_checkout(req).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("shipping_city")));
    }

    #[test]
    fn invoice_number_has_date_and_short_id() {
        let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(build_invoice_number(id, at), "INV-20260309-1b4e28ba");
    }
}
