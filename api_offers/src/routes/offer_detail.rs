use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{error::Res, http::Success};
use sqlx::PgPool;

use crate::services;

/// Returns one tier with all its fields.
#[get("/offerdetails/{id}/")]
pub async fn get_offer_detail(
    path: web::Path<i64>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let detail = services::offer::get_offer_detail(pg_pool, path.into_inner()).await?;
    Success::ok(detail)
}
