use serde_json::json;
use storefront_api::{
    config::AppConfig,
    db::{DbPool, create_orm_conn, pool_of, run_migrations},
    services::auth_service::hash_password,
    status::Role,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = pool_of(&orm);

    let admin_id = ensure_user(&pool, "admin@example.com", "admin12345", Role::Admin).await?;
    let user_id = ensure_user(&pool, "user@example.com", "user12345", Role::User).await?;

    let apparel = ensure_category(&pool, "Apparel", "Clothing and accessories").await?;
    let kitchen = ensure_category(&pool, "Kitchen", "Mugs, bottles and tableware").await?;
    let ferris = ensure_brand(&pool, "Ferris & Co").await?;
    seed_products(&pool, apparel, kitchen, ferris).await?;

    tracing::info!(%admin_id, %user_id, "seed completed");
    Ok(())
}

async fn ensure_user(pool: &DbPool, email: &str, password: &str, role: Role) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (id, email, password_hash, role, email_verified)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, email_verified = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    tracing::info!(email, role = role.as_str(), "ensured user");
    Ok(id)
}

async fn ensure_category(pool: &DbPool, name: &str, description: &str) -> anyhow::Result<Uuid> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO categories (id, name, description)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn ensure_brand(pool: &DbPool, name: &str) -> anyhow::Result<Uuid> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO brands (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_products(
    pool: &DbPool,
    apparel: Uuid,
    kitchen: Uuid,
    brand: Uuid,
) -> anyhow::Result<()> {
    // (name, description, price in minor units, discount %, stock, color, material, category)
    let products = [
        ("Crab Hoodie", "Warm fleece hoodie", 5500_i64, 10, 50, "orange", "cotton", apparel),
        ("Crab Cap", "Six-panel cap", 2000, 0, 4, "black", "cotton", apparel),
        ("Ferris Mug", "Stoneware mug, 350 ml", 1200, 25, 100, "white", "ceramic", kitchen),
        ("Steel Bottle", "Insulated bottle, 750 ml", 2500, 0, 0, "silver", "steel", kitchen),
    ];

    for (name, description, price, discount, stock, color, material, category) in products {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, description, price, discount_percent, stock_quantity, images, color, material, category_id, brand_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(discount)
        .bind(stock)
        .bind(json!([]))
        .bind(color)
        .bind(material)
        .bind(category)
        .bind(brand)
        .execute(pool)
        .await?;
    }

    tracing::info!(count = products.len(), "seeded products");
    Ok(())
}
