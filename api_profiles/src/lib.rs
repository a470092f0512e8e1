use actix_web::web;

pub mod routes {
    pub mod profile;
}
pub(crate) mod services {
    pub(crate) mod avatar;
    pub(crate) mod body;
    pub(crate) mod profile;
}
pub(crate) mod dtos {
    pub(crate) mod profile;
}

pub fn mount_profiles(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::profile::get_profile)
        .service(routes::profile::patch_profile)
        .service(routes::profile::get_business_profiles)
        .service(routes::profile::get_customer_profiles);
}
