use std::sync::Arc;

use actix_web::{HttpRequest, Responder, delete, get, patch, post, web};
use common::{error::Res, http::Success, jwt::JwtClaims};
use sqlx::PgPool;

use crate::{
    dtos::offer::{OfferCreateBody, OfferListQuery, OfferPatchBody},
    services,
};

/// Lists offers page by page. Public.
///
/// # Query
/// - `creator_id`, `min_price`, `max_delivery_time`, `search`
/// - `ordering`: `updated_at`, `-updated_at`, `min_price` or `-min_price`
/// - `page`, `page_size` (default 10, at most 100)
///
/// # Output
/// `{count, next, previous, results}`
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/offers/?search=logo&ordering=min_price&page_size=6');
/// const { count, results } = await response.json();
/// ```
#[get("/offers/")]
pub async fn get_offers(
    req: HttpRequest,
    query: web::Query<OfferListQuery>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let (filter, page) = services::validation::parse_list_query(&query)?;
    let pg_pool: &PgPool = &**pool;
    let offers = services::offer::list_offers(pg_pool, filter, page, &req.full_url()).await?;
    Success::ok(offers)
}

/// Creates an offer with exactly three tiers. Business users only.
///
/// # Frontend Example
/// ```javascript
/// await fetch('/api/offers/', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json', 'Authorization': `Token ${token}` },
///   body: JSON.stringify({
///     title: 'Grafikdesign-Paket',
///     description: 'Ein umfassendes Grafikdesign-Paket.',
///     details: [
///       { title: 'Basic', revisions: 2, delivery_time_in_days: 5, price: 100, features: ['Logo'], offer_type: 'basic' },
///       { title: 'Standard', revisions: 5, delivery_time_in_days: 7, price: 200, features: ['Logo', 'Flyer'], offer_type: 'standard' },
///       { title: 'Premium', revisions: 10, delivery_time_in_days: 10, price: 500, features: ['Logo', 'Flyer', 'Poster'], offer_type: 'premium' }
///     ]
///   })
/// });
/// ```
#[post("/offers/")]
pub async fn post_offer(
    body: web::Json<OfferCreateBody>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let offer = services::offer::create_offer(pg_pool, claims.user_id, &body).await?;
    Success::created(offer)
}

/// Returns a single offer with absolute links to its tiers.
#[get("/offers/{id}/")]
pub async fn get_offer(
    req: HttpRequest,
    path: web::Path<i64>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let origin = {
        let info = req.connection_info();
        format!("{}://{}", info.scheme(), info.host())
    };
    let pg_pool: &PgPool = &**pool;
    let offer = services::offer::get_offer(pg_pool, path.into_inner(), &origin).await?;
    Success::ok(offer)
}

/// Partially updates an offer and its tiers. Owner only.
#[patch("/offers/{id}/")]
pub async fn patch_offer(
    path: web::Path<i64>,
    body: web::Json<OfferPatchBody>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let offer = services::offer::update_offer(
        pg_pool,
        claims.user_id,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Success::ok(offer)
}

/// Deletes an offer together with its tiers. Owner only.
#[delete("/offers/{id}/")]
pub async fn delete_offer(
    path: web::Path<i64>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    services::offer::delete_offer(pg_pool, claims.user_id, path.into_inner()).await?;
    Success::no_content()
}
