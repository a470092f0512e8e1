use common::misc::OfferType;
use rust_decimal::Decimal;

pub struct OfferCreateRequest {
    pub owner_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
}

pub struct OfferDetailCreateRequest {
    pub offer_id: i64,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    pub price: Decimal,
    pub features: Vec<String>,
    pub offer_type: OfferType,
}

#[derive(Debug, Default)]
pub struct OfferUpdateRequest {
    pub title: Option<String>,
    /// `Some(None)` clears the image.
    pub image: Option<Option<String>>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct OfferDetailUpdateRequest {
    pub title: Option<String>,
    pub revisions: Option<i32>,
    pub delivery_time_in_days: Option<i32>,
    pub price: Option<Decimal>,
    pub features: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfferOrdering {
    #[default]
    Default,
    UpdatedAt,
    UpdatedAtDesc,
    MinPrice,
    MinPriceDesc,
}

impl OfferOrdering {
    pub const ALLOWED: &'static str = "updated_at, -updated_at, min_price, -min_price";

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "updated_at" => Some(OfferOrdering::UpdatedAt),
            "-updated_at" => Some(OfferOrdering::UpdatedAtDesc),
            "min_price" => Some(OfferOrdering::MinPrice),
            "-min_price" => Some(OfferOrdering::MinPriceDesc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            OfferOrdering::Default => "o.updated_at DESC, o.id ASC",
            OfferOrdering::UpdatedAt => "o.updated_at ASC, o.id ASC",
            OfferOrdering::UpdatedAtDesc => "o.updated_at DESC, o.id ASC",
            OfferOrdering::MinPrice => "agg.min_price ASC NULLS LAST, o.id ASC",
            OfferOrdering::MinPriceDesc => "agg.min_price DESC NULLS LAST, o.id ASC",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct OfferFilter {
    pub creator_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_delivery_time: Option<i32>,
    pub search: Option<String>,
    pub ordering: OfferOrdering,
}
