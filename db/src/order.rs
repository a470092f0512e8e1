use crate::{dtos::order::OrderCreateRequest, models::order::Order};
use common::{
    error::{AppError, Res},
    misc::OrderStatus,
};
use sqlx::{Executor, Postgres, types::Json};

/// Orders in which the user takes part, either as customer or as business, newest first.
pub async fn get_orders_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
) -> Res<Vec<Order>> {
    sqlx::query_as::<_, Order>(
        r#"
        SELECT * FROM orders
        WHERE customer_user_id = $1 OR business_user_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_order<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    order_id: i64,
) -> Res<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_order<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: OrderCreateRequest,
) -> Res<Order> {
    sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (
            customer_user_id, business_user_id, offer_detail_id,
            title, revisions, delivery_time_in_days, price, features, offer_type, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(data.customer_user_id)
    .bind(data.business_user_id)
    .bind(data.offer_detail_id)
    .bind(data.title)
    .bind(data.revisions)
    .bind(data.delivery_time_in_days)
    .bind(data.price)
    .bind(Json(data.features))
    .bind(data.offer_type)
    .bind(OrderStatus::InProgress.as_str())
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Writes the new status only if the row still holds `from`.
/// Returns `None` when a concurrent update already moved the order.
pub async fn update_order_status<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> Res<Option<Order>> {
    sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders SET
            status = $1,
            updated_at = (NOW() AT TIME ZONE 'utc')
        WHERE id = $2 AND status = $3
        RETURNING *
        "#,
    )
    .bind(to.as_str())
    .bind(order_id)
    .bind(from.as_str())
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Returns `false` when there was nothing to delete.
pub async fn delete_order<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    order_id: i64,
) -> Res<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_orders_by_status<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    business_user_id: i64,
    status: OrderStatus,
) -> Res<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE business_user_id = $1 AND status = $2")
        .bind(business_user_id)
        .bind(status.as_str())
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}
