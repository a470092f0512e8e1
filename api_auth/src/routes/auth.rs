use actix_web::{Responder, post, web};
use common::env_config::Config;
use common::error::Res;
use common::http::Success;
use sqlx::PgPool;
use std::sync::Arc;

use crate::dtos::auth::{LoginRequest, RegistrationRequest};
use crate::services;

/// Registers a new customer or business account.
///
/// # Input
/// - `req`: JSON payload `{username, email, password, repeated_password, type}`
/// - `pool`: Database connection pool
/// - `config`: Application configuration for JWT generation
///
/// # Output
/// - Success: 201 Created with `{token, username, email, user_id}`
/// - Error: 400 Bad Request with per-field messages, e.g. `{"username": ["Username already taken."]}`
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/registration/', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     username: 'kevin',
///     email: 'kevin@example.com',
///     password: 'asdasd24',
///     repeated_password: 'asdasd24',
///     type: 'business'
///   })
/// });
/// ```
#[post("/registration/")]
pub async fn post_registration(
    req: web::Json<RegistrationRequest>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let user = services::auth::register_user(pg_pool, &req.into_inner()).await?;
    let response = services::auth::auth_response(&user, &config.jwt_config)?;
    Success::created(response)
}

/// Authenticates a user with username and password.
///
/// # Input
/// - `login_data`: JSON payload containing username and password
/// - `config`: Application configuration for JWT generation
/// - `pool`: Database connection pool
///
/// # Output
/// - Success: 200 OK with `{token, username, email, user_id}`
/// - Error: 400 Bad Request with `{"detail": ["Invalid Credentials"]}`
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/login/', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({ username: 'andrey', password: 'asdasd' })
/// });
///
/// if (response.ok) {
///   const auth = await response.json();
///   localStorage.setItem('authToken', auth.token);
/// }
/// ```
#[post("/login/")]
pub async fn post_login(
    login_data: web::Json<LoginRequest>,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let user = services::auth::authenticate_user(pg_pool, &login_data.into_inner()).await?;
    let response = services::auth::auth_response(&user, &config.jwt_config)?;
    Success::ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::json;

    fn lazy_pool() -> Arc<PgPool> {
        Arc::new(PgPool::connect_lazy(&Config::for_tests().database_url).unwrap())
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(Config::for_tests()))
                    .service(web::scope("/api").configure(crate::mount_auth)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn registration_reports_field_errors_before_touching_db() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/registration/")
            .set_json(json!({
                "username": "kevin",
                "email": "kevin@example",
                "password": "asdasd24",
                "repeated_password": "asdasd25",
                "type": "business"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(body.get("email").is_some());
        assert!(body.get("repeated_password").is_some());
    }

    #[actix_web::test]
    async fn login_requires_both_fields() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/login/")
            .set_json(json!({ "username": "andrey" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["password"][0], "This field is required.");
    }
}
