use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{error::Res, http::Success, misc::OrderStatus};
use sqlx::PgPool;

use crate::{
    dtos::order::{CompletedOrderCount, OrderCount},
    services,
};

/// Number of orders in progress for a business user.
#[get("/order-count/{business_user_id}/")]
pub async fn get_order_count(
    path: web::Path<i64>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let order_count =
        services::order::count_orders(pg_pool, path.into_inner(), OrderStatus::InProgress).await?;
    Success::ok(OrderCount { order_count })
}

/// Number of completed orders for a business user.
#[get("/completed-order-count/{business_user_id}/")]
pub async fn get_completed_order_count(
    path: web::Path<i64>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let completed_order_count =
        services::order::count_orders(pg_pool, path.into_inner(), OrderStatus::Completed).await?;
    Success::ok(CompletedOrderCount {
        completed_order_count,
    })
}
