use crate::{
    dtos::review::{ReviewCreateRequest, ReviewFilter, ReviewUpdateRequest},
    models::review::Review,
};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres, QueryBuilder};

pub async fn get_reviews<'e, E>(executor: E, filter: ReviewFilter) -> Res<Vec<Review>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM reviews");
    let mut conditions_added = false;

    let mut add_condition_separator = |qb: &mut QueryBuilder<Postgres>| {
        if !conditions_added {
            qb.push(" WHERE ");
            conditions_added = true;
        } else {
            qb.push(" AND ");
        }
    };

    if let Some(business_user_id) = filter.business_user_id {
        add_condition_separator(&mut qb);
        qb.push("business_user_id = ").push_bind(business_user_id);
    }

    if let Some(reviewer_id) = filter.reviewer_id {
        add_condition_separator(&mut qb);
        qb.push("reviewer_id = ").push_bind(reviewer_id);
    }

    qb.push(" ORDER BY ").push(filter.ordering.sql());

    qb.build_query_as::<Review>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_review<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    review_id: i64,
) -> Res<Option<Review>> {
    sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
        .bind(review_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn exists_review<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    business_user_id: i64,
    reviewer_id: i64,
) -> Res<bool> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM reviews WHERE business_user_id = $1 AND reviewer_id = $2)",
    )
    .bind(business_user_id)
    .bind(reviewer_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_review<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: ReviewCreateRequest,
) -> Res<Review> {
    sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (business_user_id, reviewer_id, rating, description)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(data.business_user_id)
    .bind(data.reviewer_id)
    .bind(data.rating)
    .bind(data.description)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_review<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    review_id: i64,
    data: ReviewUpdateRequest,
) -> Res<Review> {
    sqlx::query_as::<_, Review>(
        r#"
        UPDATE reviews SET
            rating = COALESCE($1, rating),
            description = COALESCE($2, description),
            updated_at = (NOW() AT TIME ZONE 'utc')
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(data.rating)
    .bind(data.description)
    .bind(review_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn delete_review<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    review_id: i64,
) -> Res<()> {
    sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(executor)
        .await?;
    Ok(())
}
