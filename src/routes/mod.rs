use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod basket;
pub mod catalog;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", catalog::categories_router())
        .nest("/brands", catalog::brands_router())
        .nest("/basket", basket::router())
        .nest("/favorites", favorites::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/admin", admin::router())
}
