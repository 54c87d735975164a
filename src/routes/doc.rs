use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{
            AuditLogList, InventoryAdjustRequest, LowStockList, UpdateOrderStatusRequest,
            UpdateRoleRequest, UserList,
        },
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        basket::{AddToBasketRequest, BasketCleared, BasketLine, BasketView, UpdateBasketItemRequest},
        catalog::{BrandList, BrandRequest, CategoryList, CategoryRequest},
        favorites::{AddFavoriteRequest, FavoriteProductList},
        orders::{CheckoutRequest, OrderList, OrderWithItems},
        payments::{InitiatePaymentRequest, PaymentInitiation, WebhookAck},
        products::{CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
        reviews::{ProductReviews, ReviewRequest},
    },
    models::{
        AuditLog, BasketItem, Brand, Category, Favorite, Order, OrderItem, Product,
        RatingSummary, Review, User,
    },
    response::Meta,
    routes::{
        admin, auth, basket, catalog, favorites, health, orders, payments, products,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::verify_email,
        auth::resend_verification,
        auth::me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_reviews,
        products::upsert_review,
        products::delete_review,
        catalog::list_categories,
        catalog::get_category,
        catalog::create_category,
        catalog::update_category,
        catalog::delete_category,
        catalog::list_brands,
        catalog::get_brand,
        catalog::create_brand,
        catalog::update_brand,
        catalog::delete_brand,
        basket::list_basket,
        basket::add_to_basket,
        basket::update_basket_item,
        basket::remove_from_basket,
        basket::clear_basket,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        orders::pay_order,
        payments::payment_webhook,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_users,
        admin::update_user_role,
        admin::delete_review,
        admin::list_audit_logs
    ),
    components(
        schemas(
            User,
            Category,
            Brand,
            Product,
            RatingSummary,
            Favorite,
            BasketItem,
            Order,
            OrderItem,
            Review,
            AuditLog,
            Meta,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ProductDetail,
            CategoryRequest,
            BrandRequest,
            CategoryList,
            BrandList,
            AddToBasketRequest,
            UpdateBasketItemRequest,
            BasketLine,
            BasketView,
            BasketCleared,
            AddFavoriteRequest,
            FavoriteProductList,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            InitiatePaymentRequest,
            PaymentInitiation,
            WebhookAck,
            ReviewRequest,
            ProductReviews,
            UpdateOrderStatusRequest,
            InventoryAdjustRequest,
            UpdateRoleRequest,
            LowStockList,
            UserList,
            AuditLogList
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and email verification"),
        (name = "Products", description = "Product catalog"),
        (name = "Catalog", description = "Categories and brands"),
        (name = "Reviews", description = "Product reviews and ratings"),
        (name = "Basket", description = "Shopping basket"),
        (name = "Favorites", description = "Favorite products"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Payments", description = "Payment initiation and provider webhook"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/verify-email",
            "/api/products/{id}/reviews",
            "/api/basket/{product_id}",
            "/api/orders/{id}/payment",
            "/api/payments/webhook",
            "/api/admin/audit-logs",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
