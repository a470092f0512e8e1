use chrono::NaiveDateTime;
use db::models::order::Order;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: i64,
    pub customer_user: i64,
    pub business_user: i64,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    pub price: Decimal,
    pub features: Vec<String>,
    pub offer_type: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_user: order.customer_user_id,
            business_user: order.business_user_id,
            title: order.title,
            revisions: order.revisions,
            delivery_time_in_days: order.delivery_time_in_days,
            price: order.price,
            features: order.features.0,
            offer_type: order.offer_type,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderCount {
    pub order_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CompletedOrderCount {
    pub completed_order_count: i64,
}
