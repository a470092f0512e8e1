use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
    web,
};
use futures::future::{Ready, ok};

use common::{
    env_config::Config,
    error::Res,
    jwt::{self, JwtClaims},
};

/// Parses the `Authorization` header of every request and stores the outcome
/// as `Res<JwtClaims>` in the request extensions. Rejecting the request is left
/// to the auth middleware of the protected routes.
pub struct ExtractionMiddleware {}

impl ExtractionMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ExtractionMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for ExtractionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = ExtractionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ExtractionMiddlewareService {
            service: Arc::new(service),
        })
    }
}

pub struct ExtractionMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for ExtractionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // retrieve token from authorization header
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(jwt::token_from_header)
            .map(str::to_owned);

        let secret = req
            .app_data::<web::Data<Arc<Config>>>()
            .map(|config| config.jwt_config.secret.clone());
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            match (token, secret) {
                (Some(token), Some(secret)) => {
                    // validate token and insert claims to request object for future use
                    let claims_res = jwt::validate_jwt(&token, &secret);
                    if let Err(err) = &claims_res {
                        log::debug!("Rejected bearer token: {}", err);
                    }
                    req.extensions_mut().insert::<Res<JwtClaims>>(claims_res);
                }
                (Some(_), None) => {
                    log::warn!("Config is not registered, skipping token extraction");
                }
                _ => {}
            }
            srv.call(req).await.map(|res| res.map_into_boxed_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpRequest, HttpResponse, test, web};
    use common::jwt::{ClaimsSpec, generate_jwt};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<Res<JwtClaims>>() {
            Some(Ok(claims)) => HttpResponse::Ok().body(claims.user_id.to_string()),
            Some(Err(_)) => HttpResponse::Ok().body("invalid"),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn call(auth: Option<String>) -> String {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .wrap(ExtractionMiddleware::new())
                .route("/", web::get().to(whoami)),
        )
        .await;
        let mut req = test::TestRequest::get().uri("/");
        if let Some(value) = auth {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        let body = test::call_and_read_body(&app, req.to_request()).await;
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn stores_claims_for_valid_token() {
        let config = Config::for_tests();
        let token = generate_jwt(
            ClaimsSpec {
                user_id: 7,
                is_staff: false,
            },
            &config.jwt_config,
        )
        .unwrap();
        assert_eq!(call(Some(format!("Bearer {}", token))).await, "7");
        assert_eq!(call(Some(format!("Token {}", token))).await, "7");
    }

    #[actix_web::test]
    async fn marks_bad_or_missing_tokens() {
        assert_eq!(call(Some("Bearer nope".to_string())).await, "invalid");
        assert_eq!(call(None).await, "anonymous");
    }
}
