use std::sync::Arc;

use actix_web::{Responder, get, http::Method, web};
use common::{error::Res, http::Success};
use db::stats::PlatformStats;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize)]
pub struct BaseInfo {
    pub review_count: i64,
    pub average_rating: f64,
    pub business_profile_count: i64,
    pub offer_count: i64,
}

impl From<PlatformStats> for BaseInfo {
    fn from(stats: PlatformStats) -> Self {
        Self {
            review_count: stats.review_count,
            average_rating: stats
                .average_rating
                .and_then(|avg| avg.to_f64())
                .unwrap_or(0.0),
            business_profile_count: stats.business_profile_count,
            offer_count: stats.offer_count,
        }
    }
}

/// Platform statistics for the landing page. Public.
///
/// # Output
/// `{"review_count": 10, "average_rating": 4.6, "business_profile_count": 45, "offer_count": 150}`
#[get("/base-info/")]
async fn get_base_info(pool: web::Data<Arc<PgPool>>) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let stats = db::stats::get_platform_stats(pg_pool).await?;
    log::debug!("Platform stats: {:?}", stats);
    Success::ok(BaseInfo::from(stats))
}

pub fn mount_info(cfg: &mut web::ServiceConfig) {
    cfg.service(get_base_info);
}

pub const PUBLIC_ROUTES: &[(Method, &str)] = &[(Method::GET, "/api/base-info/")];

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn average_defaults_to_zero_without_reviews() {
        let info = BaseInfo::from(PlatformStats {
            review_count: 0,
            average_rating: None,
            business_profile_count: 3,
            offer_count: 7,
        });
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({
                "review_count": 0,
                "average_rating": 0.0,
                "business_profile_count": 3,
                "offer_count": 7
            })
        );
    }

    #[test]
    fn average_is_reported_as_number() {
        let info = BaseInfo::from(PlatformStats {
            review_count: 3,
            average_rating: Some(Decimal::new(47, 1)),
            business_profile_count: 1,
            offer_count: 1,
        });
        assert_eq!(info.average_rating, 4.7);
    }
}
