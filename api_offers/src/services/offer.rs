use std::collections::HashMap;

use api_auth::permissions;
use common::{
    error::{AppError, Res},
    misc::UserType,
    pagination::{Page, PageRequest},
};
use db::{
    dtos::offer::{OfferCreateRequest, OfferDetailCreateRequest, OfferFilter, OfferUpdateRequest},
    models::offer::OfferDetail,
};
use sqlx::PgPool;
use url::Url;

use crate::{
    dtos::offer::{
        DetailLink, OfferCreateBody, OfferDetailView, OfferFull, OfferListItem, OfferPatchBody,
        OfferView,
    },
    services::validation,
};

const NOT_BUSINESS: &str = "Authenticated user is not a 'business' profile.";
const NOT_OWNER: &str = "Only the offer owner can modify this offer.";

/// Relative link used in listings.
pub fn list_detail_url(detail_id: i64) -> String {
    format!("/offerdetails/{}/", detail_id)
}

/// Absolute link used on the retrieve endpoint, `origin` being `scheme://host`.
pub fn absolute_detail_url(origin: &str, detail_id: i64) -> String {
    format!("{}/api/offerdetails/{}/", origin.trim_end_matches('/'), detail_id)
}

/// Returns one page of offers with their tier links, cheapest price and fastest delivery.
///
/// # Arguments
///
/// * `pool` - A reference to the database connection pool.
/// * `filter` - Parsed listing filters and ordering.
/// * `page` - Requested page window.
/// * `url` - Absolute request URL, used for `next` / `previous`.
pub async fn list_offers(
    pool: &PgPool,
    filter: OfferFilter,
    page: PageRequest,
    url: &Url,
) -> Res<Page<OfferListItem>> {
    let count = db::offer::count_offers(pool, &filter).await?;
    let offers = db::offer::get_offers(pool, &filter, page.limit(), page.offset()).await?;

    let ids: Vec<i64> = offers.iter().map(|o| o.id).collect();
    let mut links: HashMap<i64, Vec<DetailLink>> = HashMap::new();
    for detail in db::offer::get_offer_details_for(pool, &ids).await? {
        links.entry(detail.offer_id).or_default().push(DetailLink {
            id: detail.id,
            url: list_detail_url(detail.id),
        });
    }

    let results = offers
        .into_iter()
        .map(|offer| {
            let details = links.remove(&offer.id).unwrap_or_default();
            OfferListItem::new(offer, details)
        })
        .collect();

    Page::new(results, count, page, url)
}

pub async fn get_offer(pool: &PgPool, offer_id: i64, origin: &str) -> Res<OfferView> {
    let offer = db::offer::get_offer_summary(pool, offer_id).await?;
    let details = db::offer::get_offer_details(pool, offer_id)
        .await?
        .into_iter()
        .map(|d| DetailLink {
            id: d.id,
            url: absolute_detail_url(origin, d.id),
        })
        .collect();
    Ok(OfferView::new(offer, details))
}

async fn get_offer_full(pool: &PgPool, offer_id: i64) -> Res<OfferFull> {
    let offer = db::offer::get_offer(pool, offer_id)
        .await?
        .ok_or_else(offer_not_found)?;
    let details = db::offer::get_offer_details(pool, offer_id).await?;
    Ok(OfferFull {
        id: offer.id,
        title: offer.title,
        image: offer.image,
        description: offer.description,
        details: details.into_iter().map(OfferDetailView::from).collect(),
    })
}

fn offer_not_found() -> AppError {
    AppError::NotFound("No Offer matches the given query.".to_string())
}

/// Creates an offer with its three tiers in one transaction.
///
/// # Arguments
///
/// * `pool` - A reference to the database connection pool.
/// * `owner_id` - Authenticated user, must have a business profile.
/// * `body` - Offer fields and exactly three details.
///
/// # Returns
///
/// The created offer with full details.
pub async fn create_offer(pool: &PgPool, owner_id: i64, body: &OfferCreateBody) -> Res<OfferFull> {
    permissions::require_user_type(pool, owner_id, UserType::Business, NOT_BUSINESS).await?;
    let new_offer = validation::validate_new_offer(body)?;

    let mut tx = pool.begin().await?;

    let offer = db::offer::insert_offer(
        &mut *tx,
        OfferCreateRequest {
            owner_id,
            title: new_offer.title,
            image: new_offer.image,
            description: new_offer.description,
        },
    )
    .await?;

    let mut details = Vec::with_capacity(new_offer.details.len());
    for detail in new_offer.details {
        let inserted = db::offer::insert_offer_detail(
            &mut *tx,
            OfferDetailCreateRequest {
                offer_id: offer.id,
                title: detail.title,
                revisions: detail.revisions,
                delivery_time_in_days: detail.delivery_time_in_days,
                price: detail.price,
                features: detail.features,
                offer_type: detail.offer_type,
            },
        )
        .await?;
        details.push(OfferDetailView::from(inserted));
    }

    tx.commit().await?;
    log::info!("User {} created offer {}", owner_id, offer.id);

    Ok(OfferFull {
        id: offer.id,
        title: offer.title,
        image: offer.image,
        description: offer.description,
        details,
    })
}

async fn require_owner(pool: &PgPool, caller_id: i64, offer_id: i64) -> Res<()> {
    let offer = db::offer::get_offer(pool, offer_id)
        .await?
        .ok_or_else(offer_not_found)?;
    if offer.owner_id != caller_id {
        return Err(AppError::Forbidden(NOT_OWNER.to_string()));
    }
    Ok(())
}

/// Partially updates an offer and any of its existing tiers. Tiers are addressed
/// by `offer_type`; the number of tiers never changes.
pub async fn update_offer(
    pool: &PgPool,
    caller_id: i64,
    offer_id: i64,
    body: OfferPatchBody,
) -> Res<OfferFull> {
    require_owner(pool, caller_id, offer_id).await?;
    let detail_patches = validation::validate_offer_patch(&body)?;

    let mut tx = pool.begin().await?;

    let existing: HashMap<String, OfferDetail> = db::offer::get_offer_details(&mut *tx, offer_id)
        .await?
        .into_iter()
        .map(|d| (d.offer_type.clone(), d))
        .collect();

    for patch in detail_patches {
        let Some(detail) = existing.get(patch.offer_type.as_str()) else {
            return Err(AppError::field(
                "details",
                format!(
                    "Detail with offer_type '{}' does not exist for this offer.",
                    patch.offer_type
                ),
            ));
        };
        if patch.id.is_some_and(|id| id != detail.id) {
            return Err(AppError::field(
                "details",
                format!("Detail id mismatch for offer_type '{}'.", patch.offer_type),
            ));
        }
        db::offer::update_offer_detail(&mut *tx, detail.id, patch.update).await?;
    }

    db::offer::update_offer(
        &mut *tx,
        offer_id,
        OfferUpdateRequest {
            title: body.title,
            image: body.image,
            description: body.description,
        },
    )
    .await?;

    tx.commit().await?;
    get_offer_full(pool, offer_id).await
}

pub async fn delete_offer(pool: &PgPool, caller_id: i64, offer_id: i64) -> Res<()> {
    require_owner(pool, caller_id, offer_id).await?;
    db::offer::delete_offer(pool, offer_id).await?;
    log::info!("User {} deleted offer {}", caller_id, offer_id);
    Ok(())
}

pub async fn get_offer_detail(pool: &PgPool, detail_id: i64) -> Res<OfferDetailView> {
    db::offer::get_offer_detail(pool, detail_id)
        .await?
        .map(|d| OfferDetailView::from(d.detail))
        .ok_or_else(|| AppError::NotFound("No OfferDetail matches the given query.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_relative_and_absolute_detail_urls() {
        assert_eq!(list_detail_url(4), "/offerdetails/4/");
        assert_eq!(
            absolute_detail_url("http://127.0.0.1:8000", 4),
            "http://127.0.0.1:8000/api/offerdetails/4/"
        );
        assert_eq!(
            absolute_detail_url("https://api.example.com/", 9),
            "https://api.example.com/api/offerdetails/9/"
        );
    }

    fn tier(offer_type: &str, price: i64, days: i32) -> crate::dtos::offer::OfferDetailInput {
        crate::dtos::offer::OfferDetailInput {
            title: Some(format!("Logo {}", offer_type)),
            revisions: Some(2),
            delivery_time_in_days: Some(days),
            price: Some(rust_decimal::Decimal::from(price)),
            features: Some(vec!["Logo".to_string(), "Card".to_string()]),
            offer_type: Some(offer_type.to_string()),
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn created_offer_has_one_detail_per_tier() {
        let (_container, pool) = db::testing::start_postgres().await;
        let owner = db::testing::create_user(&pool, "studio", Some(UserType::Business)).await;
        let customer = db::testing::create_user(&pool, "client", Some(UserType::Customer)).await;

        let body = OfferCreateBody {
            title: Some("Logo design".to_string()),
            description: Some("Vector logos".to_string()),
            details: Some(vec![
                tier("premium", 500, 2),
                tier("basic", 100, 7),
                tier("standard", 250, 5),
            ]),
            ..Default::default()
        };

        let created = create_offer(&pool, owner.id, &body).await.unwrap();
        assert_eq!(created.details.len(), 3);

        let stored = db::offer::get_offer_details(&pool, created.id).await.unwrap();
        let types: Vec<&str> = stored.iter().map(|d| d.offer_type.as_str()).collect();
        assert_eq!(types, ["basic", "standard", "premium"]);

        let summary = db::offer::get_offer_summary(&pool, created.id).await.unwrap();
        assert_eq!(summary.min_price, Some(rust_decimal::Decimal::from(100)));
        assert_eq!(summary.min_delivery_time, Some(2));

        // customers cannot create offers and nothing is written for them
        assert!(matches!(
            create_offer(&pool, customer.id, &body).await,
            Err(AppError::Forbidden(_))
        ));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offer_details")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 3);
    }
}
