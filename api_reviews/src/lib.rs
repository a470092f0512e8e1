use actix_web::web;

pub mod routes {
    pub mod review;
}
pub(crate) mod services {
    pub(crate) mod review;
}
pub(crate) mod dtos {
    pub(crate) mod review;
}

pub fn mount_reviews(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::review::get_reviews)
        .service(routes::review::post_review)
        .service(routes::review::patch_review)
        .service(routes::review::delete_review);
}
