pub struct ReviewCreateRequest {
    pub business_user_id: i64,
    pub reviewer_id: i64,
    pub rating: i32,
    pub description: String,
}

#[derive(Debug, Default)]
pub struct ReviewUpdateRequest {
    pub rating: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewOrdering {
    #[default]
    Default,
    UpdatedAt,
    UpdatedAtDesc,
    Rating,
    RatingDesc,
}

impl ReviewOrdering {
    pub const ALLOWED: &'static str = "updated_at, -updated_at, rating, -rating";

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "updated_at" => Some(ReviewOrdering::UpdatedAt),
            "-updated_at" => Some(ReviewOrdering::UpdatedAtDesc),
            "rating" => Some(ReviewOrdering::Rating),
            "-rating" => Some(ReviewOrdering::RatingDesc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            ReviewOrdering::Default => "updated_at DESC, id DESC",
            ReviewOrdering::UpdatedAt => "updated_at ASC, id ASC",
            ReviewOrdering::UpdatedAtDesc => "updated_at DESC, id DESC",
            ReviewOrdering::Rating => "rating ASC, id ASC",
            ReviewOrdering::RatingDesc => "rating DESC, id DESC",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ReviewFilter {
    pub business_user_id: Option<i64>,
    pub reviewer_id: Option<i64>,
    pub ordering: ReviewOrdering,
}
