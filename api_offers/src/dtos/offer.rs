use chrono::NaiveDateTime;
use common::validation::present_or_null;
use db::models::offer::{OfferDetail, OfferSummary};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// Raw listing query. Values are parsed by the service so that malformed ones
/// are reported per parameter.
#[derive(Debug, Default, Deserialize)]
pub struct OfferListQuery {
    pub creator_id: Option<String>,
    pub min_price: Option<String>,
    pub max_delivery_time: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// One tier as sent by the client, on create and on patch.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OfferDetailInput {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub revisions: Option<i32>,
    pub delivery_time_in_days: Option<i32>,
    pub price: Option<Decimal>,
    pub features: Option<Vec<String>>,
    pub offer_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OfferCreateBody {
    pub title: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub details: Option<Vec<OfferDetailInput>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OfferPatchBody {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub image: Option<Option<String>>,
    pub description: Option<String>,
    pub details: Option<Vec<OfferDetailInput>>,
}

#[derive(Debug, Serialize)]
pub struct DetailLink {
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct UserDetails {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct OfferListItem {
    pub id: i64,
    pub user: i64,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub details: Vec<DetailLink>,
    pub min_price: Option<f64>,
    pub min_delivery_time: Option<i32>,
    pub user_details: UserDetails,
}

impl OfferListItem {
    pub fn new(offer: OfferSummary, details: Vec<DetailLink>) -> Self {
        Self {
            id: offer.id,
            user: offer.owner_id,
            title: offer.title,
            image: offer.image,
            description: offer.description,
            created_at: offer.created_at,
            updated_at: offer.updated_at,
            details,
            min_price: offer.min_price.and_then(|p| p.to_f64()),
            min_delivery_time: offer.min_delivery_time,
            user_details: UserDetails {
                first_name: offer.owner_first_name,
                last_name: offer.owner_last_name,
                username: offer.owner_username,
            },
        }
    }
}

/// Single offer as returned by the retrieve endpoint.
#[derive(Debug, Serialize)]
pub struct OfferView {
    pub id: i64,
    pub user: i64,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub details: Vec<DetailLink>,
    pub min_price: Option<f64>,
    pub min_delivery_time: Option<i32>,
}

impl OfferView {
    pub fn new(offer: OfferSummary, details: Vec<DetailLink>) -> Self {
        Self {
            id: offer.id,
            user: offer.owner_id,
            title: offer.title,
            image: offer.image,
            description: offer.description,
            created_at: offer.created_at,
            updated_at: offer.updated_at,
            details,
            min_price: offer.min_price.and_then(|p| p.to_f64()),
            min_delivery_time: offer.min_delivery_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OfferDetailView {
    pub id: i64,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    pub price: Decimal,
    pub features: Vec<String>,
    pub offer_type: String,
}

impl From<OfferDetail> for OfferDetailView {
    fn from(d: OfferDetail) -> Self {
        Self {
            id: d.id,
            title: d.title,
            revisions: d.revisions,
            delivery_time_in_days: d.delivery_time_in_days,
            price: d.price,
            features: d.features.0,
            offer_type: d.offer_type,
        }
    }
}

/// Offer with its full tiers, returned after create and patch.
#[derive(Debug, Serialize)]
pub struct OfferFull {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub details: Vec<OfferDetailView>,
}
