use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::basket::{AddToBasketRequest, BasketCleared, BasketView, UpdateBasketItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::BasketItem,
    response::ApiResponse,
    routes::params::Pagination,
    services::basket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_basket).post(add_to_basket).delete(clear_basket),
        )
        .route(
            "/{product_id}",
            put(update_basket_item).delete(remove_from_basket),
        )
}

#[utoipa::path(
    get,
    path = "/api/basket",
    params(Pagination),
    responses(
        (status = 200, description = "Basket lines with totals", body = ApiResponse<BasketView>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn list_basket(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BasketView>>> {
    let resp = basket_service::list_basket(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/basket",
    request_body = AddToBasketRequest,
    responses(
        (status = 200, description = "Item added; quantities of an existing line are summed", body = ApiResponse<BasketItem>),
        (status = 400, description = "Invalid quantity, product or insufficient stock"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn add_to_basket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToBasketRequest>,
) -> AppResult<Json<ApiResponse<BasketItem>>> {
    let resp = basket_service::add_to_basket(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/basket/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateBasketItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ApiResponse<BasketItem>),
        (status = 400, description = "Invalid quantity or insufficient stock"),
        (status = 404, description = "Product not in basket")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn update_basket_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateBasketItemRequest>,
) -> AppResult<Json<ApiResponse<BasketItem>>> {
    let resp = basket_service::update_quantity(&state, &user, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/basket/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Removed; returns the remaining basket", body = ApiResponse<BasketView>),
        (status = 404, description = "Product not in basket")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn remove_from_basket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BasketView>>> {
    let resp = basket_service::remove_from_basket(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/basket",
    responses(
        (status = 200, description = "Basket cleared", body = ApiResponse<BasketCleared>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn clear_basket(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BasketCleared>>> {
    let resp = basket_service::clear_basket(&state, &user).await?;
    Ok(Json(resp))
}
