use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::basket::{AddToBasketRequest, BasketCleared, BasketLine, BasketView, UpdateBasketItemRequest},
    entity::{
        basket_items::{Column as BasketCol, Entity as BasketItems},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{BasketItem, Product},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service,
    state::AppState,
};

pub async fn list_basket(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<BasketView>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = BasketItems::find().filter(BasketCol::UserId.eq(user.user_id));
    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .order_by_desc(BasketCol::CreatedAt)
        .find_also_related(Products)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .filter_map(|(line, product)| {
            let product = Product::from(product?);
            Some(BasketLine {
                id: line.id,
                line_total: pricing::line_total(product.final_price, line.quantity),
                product,
                quantity: line.quantity,
            })
        })
        .collect();

    let (total_quantity, total_amount): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(b.quantity), 0)::bigint,
               LEAST(
                   COALESCE(SUM((p.price - div(p.price::numeric * p.discount_percent, 100)) * b.quantity), 0),
                   9223372036854775807
               )::bigint
        FROM basket_items b
        JOIN products p ON p.id = b.product_id
        WHERE b.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        BasketView {
            items,
            total_quantity,
            total_amount,
        },
        Some(meta),
    ))
}

pub async fn add_to_basket(
    state: &AppState,
    user: &AuthUser,
    payload: AddToBasketRequest,
) -> AppResult<ApiResponse<BasketItem>> {
    validate_quantity(payload.quantity)?;
    let product = product_service::find_active(&state.orm, payload.product_id).await?;

    let current = BasketItems::find()
        .filter(BasketCol::UserId.eq(user.user_id))
        .filter(BasketCol::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?
        .map(|line| line.quantity)
        .unwrap_or(0);
    let wanted = current
        .checked_add(payload.quantity)
        .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
    ensure_stock(&product, wanted)?;

    let item: BasketItem = sqlx::query_as(
        r#"
        INSERT INTO basket_items (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = basket_items.quantity + EXCLUDED.quantity
        RETURNING id, user_id, product_id, quantity, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .fetch_one(&state.pool)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "basket_add",
        "basket_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": item.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Added to basket", item, None))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateBasketItemRequest,
) -> AppResult<ApiResponse<BasketItem>> {
    validate_quantity(payload.quantity)?;
    let product = product_service::find_active(&state.orm, product_id).await?;
    ensure_stock(&product, payload.quantity)?;

    let item: Option<BasketItem> = sqlx::query_as(
        r#"
        UPDATE basket_items
        SET quantity = $3
        WHERE user_id = $1 AND product_id = $2
        RETURNING id, user_id, product_id, quantity, created_at
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .bind(payload.quantity)
    .fetch_optional(&state.pool)
    .await?;
    let item = item.ok_or(AppError::NotFound)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "basket_update",
        "basket_items",
        serde_json::json!({ "product_id": product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Basket updated", item, None))
}

pub async fn remove_from_basket(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<BasketView>> {
    let result = BasketItems::delete_many()
        .filter(BasketCol::UserId.eq(user.user_id))
        .filter(BasketCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "basket_remove",
        "basket_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    let basket = list_basket(state, user, Pagination::default()).await?;
    Ok(ApiResponse {
        message: "Removed from basket".into(),
        ..basket
    })
}

pub async fn clear_basket(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BasketCleared>> {
    let result = BasketItems::delete_many()
        .filter(BasketCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Basket cleared",
        BasketCleared {
            removed: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn ensure_stock(product: &ProductModel, quantity: i32) -> AppResult<()> {
    if quantity > product.stock_quantity {
        return Err(AppError::BadRequest(format!(
            "Only {} of {} in stock",
            product.stock_quantity, product.name
        )));
    }
    Ok(())
}
