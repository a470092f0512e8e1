use actix_web::{http::Method, web};

pub mod routes {
    pub mod offer;
    pub mod offer_detail;
}
pub(crate) mod services {
    pub(crate) mod offer;
    pub(crate) mod validation;
}
pub(crate) mod dtos {
    pub(crate) mod offer;
}

pub fn mount_offers(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::offer::get_offers)
        .service(routes::offer::post_offer)
        .service(routes::offer::get_offer)
        .service(routes::offer::patch_offer)
        .service(routes::offer::delete_offer)
        .service(routes::offer_detail::get_offer_detail);
}

/// The offer listing is browsable without an account.
pub const PUBLIC_ROUTES: &[(Method, &str)] = &[(Method::GET, "/api/offers/")];
