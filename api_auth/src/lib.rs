use actix_web::{http::Method, web};
use middleware::auth::AuthMiddleware;

pub mod guests;
pub mod permissions;
pub mod middleware {
    pub mod auth;
}
pub mod routes {
    pub mod auth;
    pub mod user;
}
pub(crate) mod services {
    pub(crate) mod auth;
    pub(crate) mod password;
    pub(crate) mod user;
}
pub(crate) mod dtos {
    pub(crate) mod auth;
}

/// Registration and login. Both are public and must be listed in the
/// auth middleware's public routes.
pub fn mount_auth(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::auth::post_registration)
        .service(routes::auth::post_login);
}

pub fn mount_user(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::user::get_me);
}

/// Routes served without credentials, matched on method and full request path.
pub const PUBLIC_ROUTES: &[(Method, &str)] = &[
    (Method::POST, "/api/registration/"),
    (Method::POST, "/api/login/"),
];

/// Requires a valid token on every route of the wrapped scope except `public`.
pub fn auth_middleware(public: Vec<(Method, &'static str)>) -> AuthMiddleware {
    AuthMiddleware::new(public)
}
