use actix_web::body::{BoxBody, MessageBody};
use actix_web::web;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use actix_web::{HttpMessage, ResponseError};
use colored::Colorize;
use common::env_config::Config;
use common::error::Res;
use common::jwt::JwtClaims;
use futures::future::{LocalBoxFuture, Ready, ready};
use log::info;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Instant;

/// Logs one colored line per request with status, method, path, elapsed time,
/// caller and query parameters.
pub struct LoggerMiddleware {}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for LoggerMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
    <B as MessageBody>::Error: ResponseError,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Arc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
    <B as MessageBody>::Error: ResponseError,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();

        // Common request info
        let method = req.method().to_string();
        let path = req.path().to_string();
        let params_json = params_to_json(req.query_string());

        let console_logging_enabled = req
            .app_data::<web::Data<Arc<Config>>>()
            .map(|config| config.console_logging_enabled)
            .unwrap_or(true);

        // Jwt claims, when a valid token was sent
        let user_id = match req.extensions().get::<Res<JwtClaims>>() {
            Some(Ok(claims)) => Some(claims.user_id),
            _ => None,
        };

        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            // Call next services
            let res = srv.call(req).await?;

            if console_logging_enabled {
                let status_code = res.status().as_u16();
                let elapsed_ms = started.elapsed().as_millis();

                let colored_status = match status_code {
                    200..=299 => status_code.to_string().green(),
                    300..=399 => status_code.to_string().yellow(),
                    400..=499 => status_code.to_string().bright_red(),
                    _ => status_code.to_string().red(),
                };

                let colored_method = match method.as_str() {
                    "GET" => method.blue(),
                    "POST" => method.yellow(),
                    "PUT" | "PATCH" => method.purple(),
                    "DELETE" => method.red(),
                    _ => method.normal(),
                };

                info!(
                    "[{}] {} {} {} user_id={} params={}",
                    colored_status,
                    colored_method,
                    path.bright_white(),
                    format!("({}ms)", elapsed_ms).bright_black(),
                    user_id
                        .map_or("None".to_string(), |id| id.to_string())
                        .bright_blue(),
                    params_json.to_string().bright_cyan(),
                );
            }

            Ok(res.map_into_boxed_body())
        })
    }
}

/// Turns a raw query string into a JSON object. Flags without a value become `true`.
fn params_to_json(query_string: &str) -> Value {
    let mut params_map = Map::new();
    for pair in query_string.split('&').filter(|pair| !pair.is_empty()) {
        if let Some(pos) = pair.find('=') {
            let key = &pair[0..pos];
            let value = &pair[pos + 1..];
            params_map.insert(key.to_string(), json!(value));
        } else {
            params_map.insert(pair.to_string(), json!(true));
        }
    }
    Value::Object(params_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test};

    #[::core::prelude::v1::test]
    fn query_string_becomes_json_object() {
        assert_eq!(params_to_json(""), json!({}));
        assert_eq!(
            params_to_json("search=logo&page=2&verbose"),
            json!({ "search": "logo", "page": "2", "verbose": true })
        );
    }

    #[actix_web::test]
    async fn passes_responses_through() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware::new())
                .route("/", web::get().to(|| async { HttpResponse::Created().body("ok") })),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }
}
