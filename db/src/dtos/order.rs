use rust_decimal::Decimal;

/// A new order snapshotting the commercial fields of the ordered tier.
pub struct OrderCreateRequest {
    pub customer_user_id: i64,
    pub business_user_id: i64,
    pub offer_detail_id: i64,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    pub price: Decimal,
    pub features: Vec<String>,
    pub offer_type: String,
}
