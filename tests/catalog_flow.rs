mod common;

use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use storefront_api::{
    dto::{
        catalog::{BrandRequest, CategoryRequest},
        favorites::AddFavoriteRequest,
        products::{CreateProductRequest, UpdateProductRequest},
        reviews::ReviewRequest,
    },
    entity::categories::ActiveModel as CategoryActive,
    error::AppError,
    routes::params::{Pagination, ProductQuery, ProductSortBy, SortOrder},
    services::{catalog_service, favorite_service, product_service, review_service},
};

fn product_request(name: &str, price: i64) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        description: Some("Catalog test item".into()),
        price,
        discount_percent: 0,
        stock_quantity: 5,
        images: vec!["https://img.example.test/1.png".into()],
        material: Some("cotton".into()),
        color: Some("blue".into()),
        status: None,
        category_id: None,
        brand_id: None,
    }
}

#[tokio::test]
async fn catalog_filters_and_reviews() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let admin = common::create_user(state, "admin", true).await?;
    let shopper = common::create_user(state, "user", true).await?;
    let critic = common::create_user(state, "user", true).await?;

    let category_name = common::unique("Shirts");
    let category = catalog_service::create_category(
        state,
        &admin,
        CategoryRequest {
            name: category_name.clone(),
            description: None,
        },
    )
    .await?
    .data
    .unwrap();

    let taken = catalog_service::create_category(
        state,
        &admin,
        CategoryRequest {
            name: category_name,
            description: None,
        },
    )
    .await;
    assert!(matches!(taken, Err(AppError::BadRequest(_))));

    let not_admin = catalog_service::create_brand(
        state,
        &shopper,
        BrandRequest {
            name: common::unique("Brand"),
        },
    )
    .await;
    assert!(matches!(not_admin, Err(AppError::Forbidden)));

    let brand = catalog_service::create_brand(
        state,
        &admin,
        BrandRequest {
            name: common::unique("Brand"),
        },
    )
    .await?
    .data
    .unwrap();

    let cheap = product_service::create_product(
        state,
        &admin,
        CreateProductRequest {
            category_id: Some(category.id),
            brand_id: Some(brand.id),
            discount_percent: 20,
            ..product_request(&common::unique("Tee"), 1000)
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cheap.final_price, 800);

    let pricey = product_service::create_product(
        state,
        &admin,
        CreateProductRequest {
            category_id: Some(category.id),
            ..product_request(&common::unique("Polo"), 4000)
        },
    )
    .await?
    .data
    .unwrap();

    let bad_discount = product_service::create_product(
        state,
        &admin,
        CreateProductRequest {
            discount_percent: 101,
            ..product_request(&common::unique("Broken"), 100)
        },
    )
    .await;
    assert!(matches!(bad_discount, Err(AppError::BadRequest(_))));

    let by_category = product_service::list_products(
        state,
        ProductQuery {
            category_id: Some(category.id),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(by_category.meta.as_ref().and_then(|m| m.total), Some(2));
    let ids: Vec<_> = by_category.data.unwrap().items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![pricey.id, cheap.id]);

    let by_brand_and_price = product_service::list_products(
        state,
        ProductQuery {
            category_id: Some(category.id),
            brand_id: Some(brand.id),
            max_price: Some(2000),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(by_brand_and_price.items.len(), 1);
    assert_eq!(by_brand_and_price.items[0].id, cheap.id);

    // Hidden products drop out of the public catalog.
    product_service::update_product(
        state,
        &admin,
        pricey.id,
        UpdateProductRequest {
            status: Some("hidden".into()),
            ..Default::default()
        },
    )
    .await?;
    let hidden = product_service::get_product(state, pricey.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    let out_of_range = review_service::upsert_review(
        state,
        &shopper,
        cheap.id,
        ReviewRequest {
            rating: 6,
            comment: None,
        },
    )
    .await;
    assert!(matches!(out_of_range, Err(AppError::BadRequest(_))));

    review_service::upsert_review(
        state,
        &shopper,
        cheap.id,
        ReviewRequest {
            rating: 2,
            comment: Some("Shrank".into()),
        },
    )
    .await?;
    // A second review from the same user replaces the first.
    review_service::upsert_review(
        state,
        &shopper,
        cheap.id,
        ReviewRequest {
            rating: 4,
            comment: Some("Fine after all".into()),
        },
    )
    .await?;
    review_service::upsert_review(
        state,
        &critic,
        cheap.id,
        ReviewRequest {
            rating: 5,
            comment: None,
        },
    )
    .await?;

    let detail = product_service::get_product(state, cheap.id).await?.data.unwrap();
    assert_eq!(detail.rating.count, 2);
    assert_eq!(detail.rating.average, 4.5);
    assert_eq!(detail.category.map(|c| c.id), Some(category.id));
    assert_eq!(detail.brand.map(|b| b.id), Some(brand.id));

    let reviews = review_service::list_reviews(state, cheap.id, Pagination::default())
        .await?
        .data
        .unwrap();
    assert_eq!(reviews.items.len(), 2);
    assert!(reviews.items.iter().all(|r| r.author_email.is_some()));

    review_service::delete_own_review(state, &critic, cheap.id).await?;
    let gone = review_service::delete_own_review(state, &critic, cheap.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    favorite_service::add_favorite(state, &shopper, AddFavoriteRequest { product_id: cheap.id })
        .await?;
    favorite_service::add_favorite(state, &shopper, AddFavoriteRequest { product_id: cheap.id })
        .await?;
    let favorites = favorite_service::list_favorites(state, &shopper, Pagination::default())
        .await?
        .data
        .unwrap();
    assert_eq!(favorites.items.len(), 1);

    let hidden_favorite =
        favorite_service::add_favorite(state, &shopper, AddFavoriteRequest { product_id: pricey.id })
            .await;
    assert!(matches!(hidden_favorite, Err(AppError::BadRequest(_))));

    favorite_service::remove_favorite(state, &shopper, cheap.id).await?;
    let missing = favorite_service::remove_favorite(state, &shopper, cheap.id).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn categories_and_brands_can_be_renamed_and_deleted() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let admin = common::create_user(state, "admin", true).await?;
    let shopper = common::create_user(state, "user", true).await?;

    let kitchen = catalog_service::create_category(
        state,
        &admin,
        CategoryRequest {
            name: common::unique("Kitchen"),
            description: None,
        },
    )
    .await?
    .data
    .unwrap();
    let garden = catalog_service::create_category(
        state,
        &admin,
        CategoryRequest {
            name: common::unique("Garden"),
            description: None,
        },
    )
    .await?
    .data
    .unwrap();

    let renamed_to = common::unique("Cookware");
    let renamed = catalog_service::update_category(
        state,
        &admin,
        kitchen.id,
        CategoryRequest {
            name: format!("  {renamed_to} "),
            description: Some("Pots and pans".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(renamed.name, renamed_to);
    assert_eq!(renamed.description.as_deref(), Some("Pots and pans"));

    let clash = catalog_service::update_category(
        state,
        &admin,
        garden.id,
        CategoryRequest {
            name: renamed_to.clone(),
            description: None,
        },
    )
    .await;
    assert!(matches!(clash, Err(AppError::BadRequest(_))));

    let by_shopper = catalog_service::delete_category(state, &shopper, garden.id).await;
    assert!(matches!(by_shopper, Err(AppError::Forbidden)));

    catalog_service::delete_category(state, &admin, garden.id).await?;
    assert!(matches!(
        catalog_service::get_category(state, garden.id).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        catalog_service::delete_category(state, &admin, garden.id).await,
        Err(AppError::NotFound)
    ));

    let first = catalog_service::create_brand(state, &admin, BrandRequest { name: common::unique("Acme") })
        .await?
        .data
        .unwrap();
    let second = catalog_service::create_brand(state, &admin, BrandRequest { name: common::unique("Globex") })
        .await?
        .data
        .unwrap();

    let duplicate = catalog_service::create_brand(state, &admin, BrandRequest { name: first.name.clone() }).await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));
    let clash = catalog_service::update_brand(state, &admin, second.id, BrandRequest { name: first.name.clone() }).await;
    assert!(matches!(clash, Err(AppError::BadRequest(_))));

    let new_name = common::unique("Initech");
    let updated = catalog_service::update_brand(state, &admin, second.id, BrandRequest { name: new_name.clone() })
        .await?
        .data
        .unwrap();
    assert_eq!(updated.name, new_name);

    catalog_service::delete_brand(state, &admin, first.id).await?;
    assert!(matches!(
        catalog_service::get_brand(state, first.id).await,
        Err(AppError::NotFound)
    ));
    let brands = catalog_service::list_brands(state).await?.data.unwrap();
    assert!(brands.items.iter().all(|b| b.id != first.id));
    assert!(brands.items.iter().any(|b| b.id == second.id));
    Ok(())
}

// A write that slips past the name check still comes back as a 400.
#[tokio::test]
async fn unique_violations_map_to_bad_request() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let name = common::unique("Racing");

    let row = || CategoryActive {
        id: Set(uuid::Uuid::new_v4()),
        name: Set(name.clone()),
        description: Set(None),
        created_at: NotSet,
    };
    row().insert(&state.orm).await?;

    let orm_err = row().insert(&state.orm).await.expect_err("duplicate name");
    assert!(matches!(AppError::from(orm_err), AppError::BadRequest(_)));

    let sqlx_err = sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(uuid::Uuid::new_v4())
        .bind(&name)
        .execute(&state.pool)
        .await
        .expect_err("duplicate name");
    assert!(matches!(AppError::from(sqlx_err), AppError::BadRequest(_)));
    Ok(())
}
