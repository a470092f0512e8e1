use api_auth::permissions;
use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
    misc::{OrderStatus, UserType},
    validation::only_fields,
};
use db::dtos::order::OrderCreateRequest;
use serde_json::Value;
use sqlx::PgPool;

use crate::dtos::order::OrderView;

const NOT_CUSTOMER: &str = "Only users with type 'customer' can create orders.";
const NOT_ORDER_BUSINESS: &str = "Only the business user of this order may update its status.";
const NOT_STAFF: &str = "Only admin staff users may delete orders.";
const OWN_OFFER: &str = "You cannot order your own offer.";

/// Accepts a JSON integer or a string of digits.
pub fn parse_offer_detail_id(body: &Value) -> Res<i64> {
    let id = match body.get("offer_detail_id") {
        None => return Err(AppError::field("offer_detail_id", "This field is required.")),
        Some(Value::Null) => {
            return Err(AppError::field("offer_detail_id", "This field may not be null."));
        }
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    id.ok_or_else(|| AppError::field("offer_detail_id", "A valid integer is required."))
}

/// `None` when the body leaves the status untouched.
pub fn parse_status(body: &Value) -> Res<Option<OrderStatus>> {
    match body.get("status") {
        None => Ok(None),
        Some(Value::String(s)) => OrderStatus::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::field("status", format!("\"{}\" is not a valid choice.", s))),
        Some(other) => Err(AppError::field(
            "status",
            format!("\"{}\" is not a valid choice.", other),
        )),
    }
}

pub async fn list_orders(pool: &PgPool, user_id: i64) -> Res<Vec<OrderView>> {
    let orders = db::order::get_orders_for_user(pool, user_id).await?;
    Ok(orders.into_iter().map(OrderView::from).collect())
}

/// Places an order for one offer tier, copying the tier's commercial terms.
pub async fn create_order(pool: &PgPool, customer_id: i64, body: &Value) -> Res<OrderView> {
    permissions::require_user_type(pool, customer_id, UserType::Customer, NOT_CUSTOMER).await?;
    let detail_id = parse_offer_detail_id(body)?;

    let Some(ordered) = db::offer::get_offer_detail(pool, detail_id).await? else {
        return Err(AppError::NotFound("OfferDetail not found.".to_string()));
    };
    if ordered.owner_id == customer_id {
        return Err(AppError::Forbidden(OWN_OFFER.to_string()));
    }

    let detail = ordered.detail;
    let order = db::order::insert_order(
        pool,
        OrderCreateRequest {
            customer_user_id: customer_id,
            business_user_id: ordered.owner_id,
            offer_detail_id: detail.id,
            title: detail.title,
            revisions: detail.revisions,
            delivery_time_in_days: detail.delivery_time_in_days,
            price: detail.price,
            features: detail.features.0,
            offer_type: detail.offer_type,
        },
    )
    .await?;

    log::info!(
        "Order {} placed by user {} for offer detail {}",
        order.id,
        customer_id,
        detail_id
    );
    Ok(order.into())
}

/// Moves an order along its status lifecycle. Only the business side of the order may do so.
pub async fn update_order_status(
    pool: &PgPool,
    caller_id: i64,
    order_id: i64,
    body: &Value,
) -> Res<OrderView> {
    only_fields(body, &["status"])?;

    let order = db::order::get_order(pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;

    if order.business_user_id != caller_id {
        return Err(AppError::Forbidden(NOT_ORDER_BUSINESS.to_string()));
    }
    permissions::require_user_type(pool, caller_id, UserType::Business, NOT_ORDER_BUSINESS).await?;

    let Some(next) = parse_status(body)? else {
        return Ok(order.into());
    };
    let current = OrderStatus::from_str(&order.status).ok_or_else(|| {
        AppError::Internal(format!("Order {} has unknown status '{}'", order.id, order.status))
    })?;
    let next = current.transition_to(next)?;

    let updated = db::order::update_order_status(pool, order_id, current, next)
        .await?
        .ok_or_else(|| {
            AppError::field("status", "The order status was changed in the meantime.")
        })?;

    log::info!("Order {} moved from {} to {}", order_id, current, next);
    Ok(updated.into())
}

pub async fn delete_order(pool: &PgPool, claims: &JwtClaims, order_id: i64) -> Res<()> {
    permissions::require_staff(claims, NOT_STAFF)?;
    if !db::order::delete_order(pool, order_id).await? {
        return Err(AppError::NotFound("Not found.".to_string()));
    }
    log::info!("Order {} deleted by staff user {}", order_id, claims.user_id);
    Ok(())
}

/// Number of orders of a business user in the given status.
/// Users without a business profile are reported as not found.
pub async fn count_orders(pool: &PgPool, business_user_id: i64, status: OrderStatus) -> Res<i64> {
    match db::profile::get_user_type(pool, business_user_id).await? {
        Some(UserType::Business) => {
            db::order::count_orders_by_status(pool, business_user_id, status).await
        }
        _ => Err(AppError::NotFound("Business user not found.".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn offer_detail_id_must_be_an_integer() {
        assert_eq!(parse_offer_detail_id(&json!({ "offer_detail_id": 12 })).unwrap(), 12);
        assert_eq!(parse_offer_detail_id(&json!({ "offer_detail_id": "7" })).unwrap(), 7);

        for body in [
            json!({}),
            json!({ "offer_detail_id": null }),
            json!({ "offer_detail_id": "abc" }),
            json!({ "offer_detail_id": 1.5 }),
            json!({ "offer_detail_id": [1] }),
        ] {
            let err = parse_offer_detail_id(&body).unwrap_err();
            assert!(
                matches!(err, AppError::Validation(ref e) if e.contains("offer_detail_id")),
                "{}",
                body
            );
        }
    }

    #[test]
    fn status_values_are_checked() {
        assert_eq!(
            parse_status(&json!({ "status": "completed" })).unwrap(),
            Some(OrderStatus::Completed)
        );
        assert_eq!(parse_status(&json!({})).unwrap(), None);
        assert!(parse_status(&json!({ "status": "done" })).is_err());
        assert!(parse_status(&json!({ "status": 3 })).is_err());
    }

    #[actix_web::test]
    async fn business_side_completes_an_order_once() {
        let (_container, pool) = db::testing::start_postgres().await;
        let business = db::testing::create_user(&pool, "studio", Some(UserType::Business)).await;
        let customer = db::testing::create_user(&pool, "client", Some(UserType::Customer)).await;

        let offer = db::offer::insert_offer(
            &pool,
            db::dtos::offer::OfferCreateRequest {
                owner_id: business.id,
                title: "Logo".to_string(),
                image: None,
                description: String::new(),
            },
        )
        .await
        .unwrap();
        let detail = db::offer::insert_offer_detail(
            &pool,
            db::dtos::offer::OfferDetailCreateRequest {
                offer_id: offer.id,
                title: "Logo basic".to_string(),
                revisions: 1,
                delivery_time_in_days: 5,
                price: rust_decimal::Decimal::from(150),
                features: vec!["Logo".to_string()],
                offer_type: common::misc::OfferType::Basic,
            },
        )
        .await
        .unwrap();

        let order = create_order(&pool, customer.id, &json!({ "offer_detail_id": detail.id }))
            .await
            .unwrap();
        assert_eq!(order.status, "in_progress");
        assert_eq!(order.business_user, business.id);
        assert_eq!(order.title, "Logo basic");

        // the customer side may not move the order
        assert!(matches!(
            update_order_status(&pool, customer.id, order.id, &json!({ "status": "completed" }))
                .await,
            Err(AppError::Forbidden(_))
        ));

        let completed =
            update_order_status(&pool, business.id, order.id, &json!({ "status": "completed" }))
                .await
                .unwrap();
        assert_eq!(completed.status, "completed");

        let reopened =
            update_order_status(&pool, business.id, order.id, &json!({ "status": "cancelled" }))
                .await;
        assert!(matches!(reopened, Err(AppError::Validation(ref e)) if e.contains("status")));

        assert_eq!(
            count_orders(&pool, business.id, OrderStatus::Completed).await.unwrap(),
            1
        );
        assert_eq!(
            count_orders(&pool, business.id, OrderStatus::InProgress).await.unwrap(),
            0
        );
    }
}
