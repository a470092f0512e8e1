use std::sync::Arc;

use actix_web::{HttpRequest, Responder, get, patch, web};
use common::{env_config::Config, error::Res, http::Success, jwt::JwtClaims};
use sqlx::PgPool;

use crate::services;

/// Returns the profile of user `pk`.
///
/// # Output
/// - Success: `{user, username, first_name, last_name, file, location, tel, description,
///   working_hours, type, email, created_at}` with empty strings instead of `null`
/// - Error: 404 Not Found when the user has no profile
#[get("/profile/{pk}/")]
pub async fn get_profile(
    path: web::Path<i64>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    let profile = services::profile::get_profile(pg_pool, path.into_inner()).await?;
    Success::ok(profile)
}

/// Partially updates the caller's own profile.
///
/// Accepts a JSON body, an urlencoded form or `multipart/form-data`. In a multipart
/// request a `file` part with a filename is stored as the new avatar (JPEG, PNG or
/// WEBP, at most 5MB) and `file` becomes its absolute URL.
///
/// # Output
/// - Success: 200 OK with the full profile
/// - Error: 403 Forbidden when `pk` is not the caller, 400 Bad Request for invalid fields
///
/// # Frontend Example
/// ```javascript
/// const form = new FormData();
/// form.append('location', 'Berlin');
/// form.append('file', fileInput.files[0]);
/// await fetch(`/api/profile/${userId}/`, {
///   method: 'PATCH',
///   headers: { 'Authorization': `Token ${token}` },
///   body: form
/// });
/// ```
#[patch("/profile/{pk}/")]
pub async fn patch_profile(
    req: HttpRequest,
    payload: web::Payload,
    path: web::Path<i64>,
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let user_id = path.into_inner();
    // ownership is decided before the body is read
    services::profile::ensure_owner(claims.user_id, user_id)?;

    let (patch, upload) = services::body::read_profile_patch(&req, payload).await?;

    let origin = {
        let info = req.connection_info();
        format!("{}://{}", info.scheme(), info.host())
    };

    let pg_pool: &PgPool = &**pool;
    let profile = services::profile::update_profile(
        pg_pool,
        &config,
        &origin,
        claims.user_id,
        user_id,
        patch,
        upload,
    )
    .await?;
    Success::ok(profile)
}

/// Lists all business profiles.
#[get("/profiles/business/")]
pub async fn get_business_profiles(pool: web::Data<Arc<PgPool>>) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    Success::ok(services::profile::get_business_profiles(pg_pool).await?)
}

/// Lists all customer profiles. `uploaded_at` carries the profile creation time.
#[get("/profiles/customer/")]
pub async fn get_customer_profiles(pool: web::Data<Arc<PgPool>>) -> Res<impl Responder> {
    let pg_pool: &PgPool = &**pool;
    Success::ok(services::profile::get_customer_profiles(pg_pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use common::jwt::{ClaimsSpec, generate_jwt};
    use serde_json::json;

    fn token(user_id: i64) -> String {
        let token = generate_jwt(
            ClaimsSpec {
                user_id,
                is_staff: false,
            },
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
                            .configure(crate::mount_profiles),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn anonymous_requests_are_rejected() {
        let app = app!();
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/profiles/business/").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn patching_someone_elses_profile_is_forbidden() {
        let app = app!();
        // user 999 may not even have a profile: ownership is checked first
        let req = test::TestRequest::patch()
            .uri("/api/profile/999/")
            .insert_header(("Authorization", token(1)))
            .set_json(json!({ "location": "Berlin" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn invalid_fields_are_rejected_before_any_write() {
        let app = app!();
        let req = test::TestRequest::patch()
            .uri("/api/profile/1/")
            .insert_header(("Authorization", token(1)))
            .set_json(json!({ "email": "no-at-sign", "type": "admin" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(body.get("email").is_some());
        assert!(body.get("type").is_some());
    }

    #[actix_web::test]
    async fn urlencoded_form_fields_are_read() {
        let app = app!();
        let req = test::TestRequest::patch()
            .uri("/api/profile/1/")
            .insert_header(("Authorization", token(1)))
            .insert_header(("Content-Type", "application/x-www-form-urlencoded"))
            .set_payload("location=Berlin&email=no%40at%40all&type=admin")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(body.get("email").is_some());
        assert_eq!(body["type"][0], "\"admin\" is not a valid choice.");
        assert!(body.get("location").is_none());
    }

    #[actix_web::test]
    async fn other_media_types_are_rejected() {
        let app = app!();
        let req = test::TestRequest::patch()
            .uri("/api/profile/1/")
            .insert_header(("Authorization", token(1)))
            .insert_header(("Content-Type", "text/plain"))
            .set_payload("location=Berlin")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn multipart_avatar_with_wrong_type_is_rejected() {
        let app = app!();
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"tel\"\r\n\r\n0123\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.gif\"\r\n\
             Content-Type: image/gif\r\n\r\nGIF89a\r\n--{b}--\r\n",
            b = boundary
        );
        let req = test::TestRequest::patch()
            .uri("/api/profile/1/")
            .insert_header(("Authorization", token(1)))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(body)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(body["file"][0].as_str().unwrap().contains("Unsupported"));
    }
}
