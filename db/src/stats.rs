use common::error::{AppError, Res};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

/// Platform-wide figures shown on the landing page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformStats {
    pub review_count: i64,
    /// Average rating rounded to one decimal, `None` without reviews.
    pub average_rating: Option<Decimal>,
    pub business_profile_count: i64,
    pub offer_count: i64,
}

pub async fn get_platform_stats<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
) -> Res<PlatformStats> {
    sqlx::query_as::<_, PlatformStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM reviews) AS review_count,
            (SELECT ROUND(AVG(rating)::numeric, 1) FROM reviews) AS average_rating,
            (SELECT COUNT(*) FROM profiles WHERE type = 'business') AS business_profile_count,
            (SELECT COUNT(*) FROM offers) AS offer_count
        "#,
    )
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}
