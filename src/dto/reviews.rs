use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{RatingSummary, Review};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductReviews {
    pub summary: RatingSummary,
    pub items: Vec<Review>,
}
