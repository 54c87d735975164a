mod common;

use storefront_api::{
    dto::{
        admin::UpdateRoleRequest,
        basket::AddToBasketRequest,
        orders::CheckoutRequest,
        reviews::ReviewRequest,
    },
    error::AppError,
    routes::params::{AuditLogQuery, OrderListQuery, Pagination},
    services::{admin_service, basket_service, order_service, product_service, review_service},
};
use uuid::Uuid;

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "Admin Flow".into(),
        customer_email: "admin-flow@example.com".into(),
        customer_phone: "+1 555 0177".into(),
        shipping_address: "4 Depot Rd".into(),
        shipping_city: "Springfield".into(),
        shipping_postal_code: "12345".into(),
        shipping_country: "US".into(),
        comment: None,
    }
}

#[tokio::test]
async fn admin_sees_every_order_and_customers_only_their_own() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let admin = common::create_user(state, "admin", true).await?;
    let buyer = common::create_user(state, "user", true).await?;
    let other = common::create_user(state, "user", true).await?;
    let product = common::create_product(state, 2500, 0, 10).await?;

    basket_service::add_to_basket(
        state,
        &buyer,
        AddToBasketRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    let placed = order_service::checkout(state, &buyer, checkout_request())
        .await?
        .data
        .unwrap();
    let order_id = placed.order.id;

    let mine = order_service::list_orders(state, &buyer, OrderListQuery::default()).await?;
    assert_eq!(mine.meta.as_ref().and_then(|m| m.total), Some(1));
    assert_eq!(mine.data.unwrap().items[0].id, order_id);

    let paid_only = order_service::list_orders(
        state,
        &buyer,
        OrderListQuery {
            status: Some("paid".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(paid_only.items.is_empty());

    let theirs = order_service::list_orders(state, &other, OrderListQuery::default())
        .await?
        .data
        .unwrap();
    assert!(theirs.items.is_empty());
    let peek = order_service::get_order(state, &other, order_id).await;
    assert!(matches!(peek, Err(AppError::NotFound)));
    let cancel_theirs = order_service::cancel_order(state, &other, order_id).await;
    assert!(matches!(cancel_theirs, Err(AppError::NotFound)));

    let forbidden = admin_service::list_all_orders(state, &buyer, OrderListQuery::default()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let pending = admin_service::list_all_orders(
        state,
        &admin,
        OrderListQuery {
            status: Some("pending".into()),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(pending.items.iter().all(|o| o.status == "pending"));
    assert!(pending.items.iter().any(|o| o.id == order_id));

    let detail = admin_service::get_order_admin(state, &admin, order_id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.order.user_id, buyer.user_id);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].product_id, product.id);

    let missing = admin_service::get_order_admin(state, &admin, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    // Ordered products can only be archived.
    let ordered = product_service::delete_product(state, &admin, product.id).await;
    assert!(matches!(ordered, Err(AppError::BadRequest(_))));

    let spare = common::create_product(state, 100, 0, 1).await?;
    product_service::delete_product(state, &admin, spare.id).await?;
    let gone = product_service::delete_product(state, &admin, spare.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    let checkouts = admin_service::list_audit_logs(
        state,
        &admin,
        AuditLogQuery {
            action: Some("checkout".into()),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(checkouts.items.iter().all(|log| log.action == "checkout"));
    assert!(checkouts.items.iter().any(|log| log.user_id == Some(buyer.user_id)));
    Ok(())
}

#[tokio::test]
async fn admin_manages_users_roles_and_reviews() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let admin = common::create_user(state, "admin", true).await?;
    let member = common::create_user(state, "user", true).await?;

    let users = admin_service::list_users(
        state,
        &admin,
        Pagination {
            page: Some(1),
            per_page: Some(100),
        },
    )
    .await?;
    assert!(users.meta.as_ref().and_then(|m| m.total).unwrap_or(0) >= 2);
    let listed = users.data.unwrap();
    assert!(listed.items.iter().any(|u| u.id == member.user_id));

    let not_admin = admin_service::list_users(state, &member, Pagination::default()).await;
    assert!(matches!(not_admin, Err(AppError::Forbidden)));

    let own = admin_service::update_user_role(
        state,
        &admin,
        admin.user_id,
        UpdateRoleRequest { role: "user".into() },
    )
    .await;
    assert!(matches!(own, Err(AppError::BadRequest(_))));

    let bogus = admin_service::update_user_role(
        state,
        &admin,
        member.user_id,
        UpdateRoleRequest { role: "root".into() },
    )
    .await;
    assert!(matches!(bogus, Err(AppError::BadRequest(_))));

    let nobody = admin_service::update_user_role(
        state,
        &admin,
        Uuid::new_v4(),
        UpdateRoleRequest { role: "admin".into() },
    )
    .await;
    assert!(matches!(nobody, Err(AppError::NotFound)));

    let promoted = admin_service::update_user_role(
        state,
        &admin,
        member.user_id,
        UpdateRoleRequest { role: "admin".into() },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(promoted.role, "admin");

    let role_changes = admin_service::list_audit_logs(
        state,
        &admin,
        AuditLogQuery {
            action: Some("user_role_update".into()),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(role_changes.items.iter().all(|log| log.action == "user_role_update"));
    let member_id = member.user_id.to_string();
    assert!(role_changes.items.iter().any(|log| {
        log.metadata
            .as_ref()
            .and_then(|m| m.get("user_id"))
            .and_then(|v| v.as_str())
            == Some(member_id.as_str())
    }));

    let reviewer = common::create_user(state, "user", true).await?;
    let product = common::create_product(state, 1500, 0, 2).await?;
    let review = review_service::upsert_review(
        state,
        &reviewer,
        product.id,
        ReviewRequest {
            rating: 1,
            comment: Some("Spam spam spam".into()),
        },
    )
    .await?
    .data
    .unwrap();

    let by_customer = review_service::admin_delete_review(state, &reviewer, review.id).await;
    assert!(matches!(by_customer, Err(AppError::Forbidden)));

    review_service::admin_delete_review(state, &admin, review.id).await?;
    let twice = review_service::admin_delete_review(state, &admin, review.id).await;
    assert!(matches!(twice, Err(AppError::NotFound)));

    let summary = review_service::rating_summary(&state.pool, product.id).await?;
    assert_eq!(summary.count, 0);
    assert_eq!(summary.average, 0.0);
    Ok(())
}
