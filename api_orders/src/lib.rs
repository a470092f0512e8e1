use actix_web::web;

pub mod routes {
    pub mod count;
    pub mod order;
}
pub(crate) mod services {
    pub(crate) mod order;
}
pub(crate) mod dtos {
    pub(crate) mod order;
}

pub fn mount_orders(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::order::get_orders)
        .service(routes::order::post_order)
        .service(routes::order::patch_order)
        .service(routes::order::delete_order)
        .service(routes::count::get_order_count)
        .service(routes::count::get_completed_order_count);
}
