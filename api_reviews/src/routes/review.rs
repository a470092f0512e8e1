use std::sync::Arc;

use actix_web::{Responder, delete, get, patch, post, web};
use common::{error::Res, http::Success, jwt::JwtClaims};
use serde_json::Value;
use sqlx::PgPool;

use crate::{dtos::review::ReviewListQuery, services};

/// Lists reviews, optionally filtered by business user or reviewer.
///
/// # Query
/// - `business_user_id`, `reviewer_id`
/// - `ordering`: `updated_at`, `-updated_at`, `rating` or `-rating`
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch(`/api/reviews/?business_user_id=${id}&ordering=-rating`, {
///   headers: { 'Authorization': `Token ${token}` }
/// });
/// ```
#[get("/reviews/")]
pub async fn get_reviews(
    query: web::Query<ReviewListQuery>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let filter = services::review::parse_list_query(&query)?;
    let pg_pool: &PgPool = &**pool;
    let reviews = services::review::list_reviews(pg_pool, filter).await?;
    Success::ok(reviews)
}

/// Reviews a business user. Customers only, one review per business.
///
/// # Input
/// `{"business_user": 2, "rating": 4, "description": "Alles gut."}`
#[post("/reviews/")]
pub async fn post_review(
    body: web::Json<Value>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let review = services::review::create_review(pg_pool, claims.user_id, &body).await?;
    Success::created(review)
}

#[patch("/reviews/{id}/")]
pub async fn patch_review(
    path: web::Path<i64>,
    body: web::Json<Value>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let review =
        services::review::update_review(pg_pool, claims.user_id, path.into_inner(), &body).await?;
    Success::ok(review)
}

#[delete("/reviews/{id}/")]
pub async fn delete_review(
    path: web::Path<i64>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    services::review::delete_review(pg_pool, claims.user_id, path.into_inner()).await?;
    Success::no_content()
}
