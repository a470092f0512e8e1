use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Offer {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OfferDetail {
    pub id: i64,
    pub offer_id: i64,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    pub price: Decimal,
    pub features: Json<Vec<String>>,
    pub offer_type: String,
}

/// Offer annotated with its cheapest and fastest tier plus owner names.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OfferSummary {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub min_price: Option<Decimal>,
    pub min_delivery_time: Option<i32>,
    pub owner_username: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
}

/// An offer detail together with the owner of the offer it belongs to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferDetailWithOwner {
    #[sqlx(flatten)]
    pub detail: OfferDetail,
    pub owner_id: i64,
}
