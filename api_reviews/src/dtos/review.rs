use chrono::NaiveDateTime;
use db::models::review::Review;
use serde::{Deserialize, Serialize};

/// Raw listing parameters; parsed by the service so malformed values become field errors.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewListQuery {
    pub business_user_id: Option<String>,
    pub reviewer_id: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: i64,
    pub business_user: i64,
    pub reviewer: i64,
    pub rating: i32,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            business_user: review.business_user_id,
            reviewer: review.reviewer_id,
            rating: review.rating,
            description: review.description,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}
