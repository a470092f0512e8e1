use std::sync::Arc;

use actix_web::{Responder, delete, get, patch, post, web};
use common::{error::Res, http::Success, jwt::JwtClaims};
use serde_json::Value;
use sqlx::PgPool;

use crate::services;

/// Lists the orders the caller takes part in, as customer or as business, newest first.
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/orders/', {
///   headers: { 'Authorization': `Token ${token}` }
/// });
/// const orders = await response.json();
/// ```
#[get("/orders/")]
pub async fn get_orders(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let orders = services::order::list_orders(pg_pool, claims.user_id).await?;
    Success::ok(orders)
}

/// Orders one offer tier. Customers only.
///
/// # Input
/// `{"offer_detail_id": 3}`
///
/// # Output
/// 201 with the new order, status `in_progress`.
#[post("/orders/")]
pub async fn post_order(
    body: web::Json<Value>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let order = services::order::create_order(pg_pool, claims.user_id, &body).await?;
    Success::created(order)
}

/// Updates the status of an order. Only `status` may be sent.
///
/// # Frontend Example
/// ```javascript
/// await fetch(`/api/orders/${orderId}/`, {
///   method: 'PATCH',
///   headers: { 'Content-Type': 'application/json', 'Authorization': `Token ${token}` },
///   body: JSON.stringify({ status: 'completed' })
/// });
/// ```
#[patch("/orders/{id}/")]
pub async fn patch_order(
    path: web::Path<i64>,
    body: web::Json<Value>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let order =
        services::order::update_order_status(pg_pool, claims.user_id, path.into_inner(), &body)
            .await?;
    Success::ok(order)
}

/// Deletes an order. Staff only.
#[delete("/orders/{id}/")]
pub async fn delete_order(
    path: web::Path<i64>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    services::order::delete_order(pg_pool, &claims, path.into_inner()).await?;
    Success::no_content()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use common::{
        env_config::Config,
        jwt::{ClaimsSpec, generate_jwt},
    };
    use serde_json::json;

    fn token(user_id: i64, is_staff: bool) -> String {
        let token = generate_jwt(
            ClaimsSpec { user_id, is_staff },
            &Config::for_tests().jwt_config,
        )
        .unwrap();
        format!("Token {}", token)
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Arc::new(
                        PgPool::connect_lazy(&Config::for_tests().database_url).unwrap(),
                    )))
                    .app_data(web::Data::new(Config::for_tests()))
                    .wrap(extractor::middleware())
                    .service(
                        web::scope("/api")
                            .wrap(api_auth::auth_middleware(vec![]))
                            .configure(crate::mount_orders),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn every_order_route_requires_a_token() {
        let app = app!();
        for req in [
            test::TestRequest::get().uri("/api/orders/").to_request(),
            test::TestRequest::post().uri("/api/orders/").to_request(),
            test::TestRequest::patch().uri("/api/orders/1/").to_request(),
            test::TestRequest::delete().uri("/api/orders/1/").to_request(),
            test::TestRequest::get().uri("/api/order-count/1/").to_request(),
            test::TestRequest::get()
                .uri("/api/completed-order-count/1/")
                .to_request(),
        ] {
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn patch_with_extra_fields_is_rejected() {
        let app = app!();
        let req = test::TestRequest::patch()
            .uri("/api/orders/1/")
            .insert_header(("Authorization", token(2, false)))
            .set_json(json!({ "status": "completed", "price": 1 }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert!(body["detail"].as_str().unwrap().contains("price"));
    }

    #[actix_web::test]
    async fn delete_is_forbidden_for_non_staff() {
        let app = app!();
        let req = test::TestRequest::delete()
            .uri("/api/orders/424242/")
            .insert_header(("Authorization", token(2, false)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
