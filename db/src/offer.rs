use crate::{
    dtos::offer::{
        OfferCreateRequest, OfferDetailCreateRequest, OfferDetailUpdateRequest, OfferFilter,
        OfferUpdateRequest,
    },
    models::offer::{Offer, OfferDetail, OfferDetailWithOwner, OfferSummary},
};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres, QueryBuilder, types::Json};

const OFFER_SUMMARY: &str = r#"
    SELECT o.*, agg.min_price, agg.min_delivery_time,
           u.username AS owner_username,
           u.first_name AS owner_first_name,
           u.last_name AS owner_last_name
    FROM offers o
    JOIN users u ON u.id = o.owner_id
    LEFT JOIN (
        SELECT offer_id,
               MIN(price) AS min_price,
               MIN(delivery_time_in_days) AS min_delivery_time
        FROM offer_details
        GROUP BY offer_id
    ) agg ON agg.offer_id = o.id
"#;

const OFFER_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM offers o
    LEFT JOIN (
        SELECT offer_id,
               MIN(price) AS min_price,
               MIN(delivery_time_in_days) AS min_delivery_time
        FROM offer_details
        GROUP BY offer_id
    ) agg ON agg.offer_id = o.id
"#;

/// Substring pattern for `ILIKE ... ESCAPE '\'` that matches `search` literally.
pub fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OfferFilter) {
    let mut conditions_added = false;

    let mut add_condition_separator = |qb: &mut QueryBuilder<'_, Postgres>| {
        if !conditions_added {
            qb.push(" WHERE ");
            conditions_added = true;
        } else {
            qb.push(" AND ");
        }
    };

    if let Some(creator_id) = filter.creator_id {
        add_condition_separator(qb);
        qb.push("o.owner_id = ").push_bind(creator_id);
    }

    if let Some(min_price) = filter.min_price {
        add_condition_separator(qb);
        qb.push("agg.min_price >= ").push_bind(min_price);
    }

    if let Some(max_delivery_time) = filter.max_delivery_time {
        add_condition_separator(qb);
        qb.push("agg.min_delivery_time <= ")
            .push_bind(max_delivery_time);
    }

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        add_condition_separator(qb);
        qb.push("(o.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR o.description ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// Fetches one page of offers matching `filter`, annotated with their
/// cheapest price and fastest delivery.
///
/// # Arguments
/// * `filter` - Creator, price, delivery and search constraints plus ordering.
/// * `limit`, `offset` - Page window.
pub async fn get_offers<'e, E>(
    executor: E,
    filter: &OfferFilter,
    limit: i64,
    offset: i64,
) -> Res<Vec<OfferSummary>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(OFFER_SUMMARY);
    push_filters(&mut qb, filter);

    qb.push(" ORDER BY ").push(filter.ordering.sql());
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    qb.build_query_as::<OfferSummary>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

/// Number of offers matching `filter`, ignoring pagination.
pub async fn count_offers<'e, E>(executor: E, filter: &OfferFilter) -> Res<i64>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(OFFER_COUNT);
    push_filters(&mut qb, filter);

    qb.build_query_scalar::<i64>()
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_offer_summary<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    offer_id: i64,
) -> Res<OfferSummary> {
    sqlx::query_as::<_, OfferSummary>(&format!("{} WHERE o.id = $1", OFFER_SUMMARY))
        .bind(offer_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_offer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    offer_id: i64,
) -> Res<Option<Offer>> {
    sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
        .bind(offer_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_offer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: OfferCreateRequest,
) -> Res<Offer> {
    sqlx::query_as::<_, Offer>(
        r#"
        INSERT INTO offers (owner_id, title, image, description)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(data.owner_id)
    .bind(data.title)
    .bind(data.image)
    .bind(data.description)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Applies a partial update and always bumps `updated_at`, so patching only
/// the tiers still marks the offer as changed.
pub async fn update_offer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    offer_id: i64,
    data: OfferUpdateRequest,
) -> Res<Offer> {
    let (image_set, image) = match data.image {
        Some(image) => (true, image),
        None => (false, None),
    };

    sqlx::query_as::<_, Offer>(
        r#"
        UPDATE offers SET
            title = COALESCE($1, title),
            image = CASE WHEN $2 THEN $3 ELSE image END,
            description = COALESCE($4, description),
            updated_at = (NOW() AT TIME ZONE 'utc')
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(data.title)
    .bind(image_set)
    .bind(image)
    .bind(data.description)
    .bind(offer_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn delete_offer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    offer_id: i64,
) -> Res<()> {
    sqlx::query("DELETE FROM offers WHERE id = $1")
        .bind(offer_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn insert_offer_detail<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: OfferDetailCreateRequest,
) -> Res<OfferDetail> {
    sqlx::query_as::<_, OfferDetail>(
        r#"
        INSERT INTO offer_details
            (offer_id, title, revisions, delivery_time_in_days, price, features, offer_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(data.offer_id)
    .bind(data.title)
    .bind(data.revisions)
    .bind(data.delivery_time_in_days)
    .bind(data.price)
    .bind(Json(data.features))
    .bind(data.offer_type.as_str())
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_offer_detail<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    detail_id: i64,
    data: OfferDetailUpdateRequest,
) -> Res<OfferDetail> {
    sqlx::query_as::<_, OfferDetail>(
        r#"
        UPDATE offer_details SET
            title = COALESCE($1, title),
            revisions = COALESCE($2, revisions),
            delivery_time_in_days = COALESCE($3, delivery_time_in_days),
            price = COALESCE($4, price),
            features = COALESCE($5, features)
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(data.title)
    .bind(data.revisions)
    .bind(data.delivery_time_in_days)
    .bind(data.price)
    .bind(data.features.map(Json))
    .bind(detail_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Details of one offer, ordered basic, standard, premium.
pub async fn get_offer_details<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    offer_id: i64,
) -> Res<Vec<OfferDetail>> {
    get_offer_details_for(executor, &[offer_id]).await
}

/// Details of several offers in one round trip, grouped by offer and ordered by tier.
pub async fn get_offer_details_for<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    offer_ids: &[i64],
) -> Res<Vec<OfferDetail>> {
    sqlx::query_as::<_, OfferDetail>(
        r#"
        SELECT * FROM offer_details
        WHERE offer_id = ANY($1)
        ORDER BY offer_id,
            CASE offer_type WHEN 'basic' THEN 0 WHEN 'standard' THEN 1 ELSE 2 END
        "#,
    )
    .bind(offer_ids)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_offer_detail<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    detail_id: i64,
) -> Res<Option<OfferDetailWithOwner>> {
    sqlx::query_as::<_, OfferDetailWithOwner>(
        r#"
        SELECT d.*, o.owner_id
        FROM offer_details d
        JOIN offers o ON o.id = d.offer_id
        WHERE d.id = $1
        "#,
    )
    .bind(detail_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}
