use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::reviews::{ProductReviews, ReviewRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{RatingSummary, Review},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service,
    state::AppState,
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

const REVIEW_COLUMNS: &str = "r.id, r.product_id, r.user_id, u.email AS author_email, r.rating, r.comment, r.created_at, r.updated_at";

/// Average rating and review count for one product. A product with no
/// reviews reports `0.0` / `0`.
pub async fn rating_summary(pool: &DbPool, product_id: Uuid) -> AppResult<RatingSummary> {
    let (count, average): (i64, Option<f64>) = sqlx::query_as(
        "SELECT COUNT(*), AVG(rating)::float8 FROM reviews WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(RatingSummary {
        average: average.map(round_rating).unwrap_or(0.0),
        count,
    })
}

pub async fn list_reviews(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductReviews>> {
    product_service::find_active(&state.orm, product_id).await?;
    let (page, limit, offset) = pagination.normalize();

    let summary = rating_summary(&state.pool, product_id).await?;

    let items: Vec<Review> = sqlx::query_as(&format!(
        r#"
        SELECT {REVIEW_COLUMNS}
        FROM reviews r
        LEFT JOIN users u ON u.id = r.user_id
        WHERE r.product_id = $1
        ORDER BY r.created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, summary.count);
    Ok(ApiResponse::success(
        "OK",
        ProductReviews { summary, items },
        Some(meta),
    ))
}

/// One review per user per product; posting again replaces the earlier one.
pub async fn upsert_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(MIN_RATING..=MAX_RATING).contains(&payload.rating) {
        return Err(AppError::BadRequest(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    product_service::find_active(&state.orm, product_id).await?;

    let comment = payload
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let review_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO reviews (id, product_id, user_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (product_id, user_id)
        DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment, updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(user.user_id)
    .bind(payload.rating)
    .bind(&comment)
    .fetch_one(&state.pool)
    .await?;

    let review = fetch_review(&state.pool, review_id)
        .await?
        .ok_or(AppError::NotFound)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_upsert",
        "reviews",
        serde_json::json!({ "product_id": product_id, "rating": review.rating }),
    )
    .await;

    Ok(ApiResponse::success("Review saved", review, Some(Meta::empty())))
}

pub async fn delete_own_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM reviews WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_delete",
        "reviews",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn admin_delete_review(
    state: &AppState,
    user: &AuthUser,
    review_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_moderate",
        "reviews",
        serde_json::json!({ "review_id": review_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn fetch_review(pool: &DbPool, id: Uuid) -> AppResult<Option<Review>> {
    let review = sqlx::query_as(&format!(
        r#"
        SELECT {REVIEW_COLUMNS}
        FROM reviews r
        LEFT JOIN users u ON u.id = r.user_id
        WHERE r.id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(review)
}

fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_round_to_two_places() {
        assert_eq!(round_rating(4.666_666), 4.67);
        assert_eq!(round_rating(3.0), 3.0);
    }
}
