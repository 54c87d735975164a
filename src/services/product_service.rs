use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
    ActiveValue::NotSet,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
    entity::{
        brands::Entity as Brands,
        categories::Entity as Categories,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Brand, Category, Product},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::review_service,
    state::AppState,
    status::ProductStatus,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition =
        Condition::all().add(Column::Status.eq(ProductStatus::Active.as_str()));

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(brand_id) = query.brand_id {
        condition = condition.add(Column::BrandId.eq(brand_id));
    }
    if let Some(color) = query.color.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Color).ilike(escape_like(color)));
    }
    if let Some(material) = query.material.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Material).ilike(escape_like(material)));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if query.in_stock == Some(true) {
        condition = condition.add(Column::StockQuantity.gt(0));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .filter(Column::Status.eq(ProductStatus::Active.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let category = match product.category_id {
        Some(category_id) => Categories::find_by_id(category_id)
            .one(&state.orm)
            .await?
            .map(Category::from),
        None => None,
    };
    let brand = match product.brand_id {
        Some(brand_id) => Brands::find_by_id(brand_id)
            .one(&state.orm)
            .await?
            .map(Brand::from),
        None => None,
    };
    let rating = review_service::rating_summary(&state.pool, product.id).await?;

    let data = ProductDetail {
        product: Product::from(product),
        category,
        brand,
        rating,
    };
    Ok(ApiResponse::success("Product", data, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    validate_numbers(Some(payload.price), Some(payload.discount_percent), Some(payload.stock_quantity))?;
    let status = match payload.status.as_deref() {
        Some(raw) => raw.parse::<ProductStatus>()?,
        None => ProductStatus::Active,
    };
    ensure_references(&state.orm, payload.category_id, payload.brand_id).await?;
    ensure_name_free(&state.orm, &name, None).await?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        discount_percent: Set(payload.discount_percent),
        stock_quantity: Set(payload.stock_quantity),
        images: Set(serde_json::json!(payload.images)),
        material: Set(payload.material),
        color: Set(payload.color),
        status: Set(status.as_str().to_string()),
        category_id: Set(payload.category_id),
        brand_id: Set(payload.brand_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    validate_numbers(payload.price, payload.discount_percent, payload.stock_quantity)?;
    ensure_references(&state.orm, payload.category_id, payload.brand_id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".into()));
        }
        ensure_name_free(&state.orm, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(discount) = payload.discount_percent {
        active.discount_percent = Set(discount);
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if let Some(images) = payload.images {
        active.images = Set(serde_json::json!(images));
    }
    if let Some(material) = payload.material {
        active.material = Set(Some(material));
    }
    if let Some(color) = payload.color {
        active.color = Set(Some(color));
    }
    if let Some(status) = payload.status {
        active.status = Set(status.parse::<ProductStatus>()?.as_str().to_string());
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    // Order lines keep a reference to the product; those must be archived instead.
    let ordered: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM order_items WHERE product_id = $1)")
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    if ordered {
        return Err(AppError::BadRequest(
            "Product has been ordered; set its status to archived instead".into(),
        ));
    }

    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Load a product a customer may act on (basket, favorites, reviews).
pub async fn find_active<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .filter(Column::Status.eq(ProductStatus::Active.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| AppError::BadRequest("Product not found".into()))
}

fn validate_numbers(
    price: Option<i64>,
    discount_percent: Option<i32>,
    stock_quantity: Option<i32>,
) -> AppResult<()> {
    if price.is_some_and(|p| !pricing::valid_price(p)) {
        return Err(AppError::BadRequest(format!(
            "price must be between 0 and {}",
            pricing::MAX_PRICE
        )));
    }
    if discount_percent.is_some_and(|d| !pricing::valid_discount(d)) {
        return Err(AppError::BadRequest(
            "discount_percent must be between 0 and 100".into(),
        ));
    }
    if stock_quantity.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock_quantity must not be negative".into()));
    }
    Ok(())
}

async fn ensure_references<C: ConnectionTrait>(
    db: &C,
    category_id: Option<Uuid>,
    brand_id: Option<Uuid>,
) -> AppResult<()> {
    if let Some(category_id) = category_id {
        if Categories::find_by_id(category_id).one(db).await?.is_none() {
            return Err(AppError::BadRequest("Category not found".into()));
        }
    }
    if let Some(brand_id) = brand_id {
        if Brands::find_by_id(brand_id).one(db).await?.is_none() {
            return Err(AppError::BadRequest("Brand not found".into()));
        }
    }
    Ok(())
}

/// Make user text match literally under `ILIKE` (backslash is the default escape).
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(db).await?.is_some() {
        return Err(AppError::BadRequest("Product name is already taken".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{escape_like, validate_numbers};
    use crate::pricing::MAX_PRICE;

    #[test]
    fn numeric_fields_are_range_checked() {
        assert!(validate_numbers(Some(0), Some(0), Some(0)).is_ok());
        assert!(validate_numbers(None, None, None).is_ok());
        assert!(validate_numbers(Some(-1), None, None).is_err());
        assert!(validate_numbers(None, Some(101), None).is_err());
        assert!(validate_numbers(None, None, Some(-3)).is_err());
        assert!(validate_numbers(Some(MAX_PRICE), None, None).is_ok());
        assert!(validate_numbers(Some(i64::MAX / 10), None, None).is_err());
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("mug"), "mug");
        assert_eq!(escape_like("100%_cotton"), "100\\%\\_cotton");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
