use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
};
use common::jwt;
use futures::future::{Ready, ok};

/// Rejects requests without valid JWT claims with 401 and exposes the claims
/// to handlers through `web::ReqData<JwtClaims>`.
///
/// The claims themselves are parsed earlier by the extractor middleware; this
/// layer only decides whether the route needs them.
pub struct AuthMiddleware {
    public: Rc<Vec<(Method, &'static str)>>,
}

impl AuthMiddleware {
    pub fn new(public: Vec<(Method, &'static str)>) -> Self {
        AuthMiddleware {
            public: Rc::new(public),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Arc::new(service),
            public: self.public.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
    public: Rc<Vec<(Method, &'static str)>>,
}

impl<S> AuthMiddlewareService<S> {
    fn is_public(&self, req: &ServiceRequest) -> bool {
        self.public
            .iter()
            .any(|(method, path)| req.method() == method && req.path() == *path)
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // preflight and public routes go through untouched
        if req.method() == Method::OPTIONS || self.is_public(&req) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(|res| res.map_into_boxed_body()) });
        }

        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            match jwt::get_jwt_claims_or_error(&req) {
                Ok(claims) => {
                    // insert claims to request object for the handlers
                    req.extensions_mut().insert(claims);
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Err(response) => Ok(req.into_response(response)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};
    use common::{
        env_config::Config,
        jwt::{ClaimsSpec, JwtClaims, generate_jwt},
    };

    async fn whoami(claims: web::ReqData<JwtClaims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.user_id.to_string())
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Config::for_tests()))
                    .wrap(extractor::middleware())
                    .service(
                        web::scope("/api")
                            .wrap(AuthMiddleware::new(vec![(Method::GET, "/api/open/")]))
                            .route("/open/", web::get().to(HttpResponse::Ok))
                            .route("/me/", web::get().to(whoami)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn protected_route_requires_token() {
        let app = app!();
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/me/").to_request())
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/me/")
                .insert_header(("Authorization", "Bearer broken"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_reaches_handler() {
        let app = app!();
        let token = generate_jwt(
            ClaimsSpec {
                user_id: 5,
                is_staff: false,
            },
            &Config::for_tests().jwt_config,
        )
        .unwrap();
        let req = test::TestRequest::get()
            .uri("/api/me/")
            .insert_header(("Authorization", format!("Token {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "5");
    }

    #[actix_web::test]
    async fn public_route_is_open() {
        let app = app!();
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/open/").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
