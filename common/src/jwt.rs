use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    env_config::JwtConfig,
    error::{AppError, Res},
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub user_id: i64,
    pub is_staff: bool,
    pub exp: usize,
}

pub struct ClaimsSpec {
    pub user_id: i64,
    pub is_staff: bool,
}

/// Generates JWT token based on user object and JWT configuration options
pub fn generate_jwt(spec: ClaimsSpec, config: &JwtConfig) -> Res<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.expiration_hours))
        .ok_or_else(|| AppError::Internal("Token expiration overflow".to_string()))?
        .timestamp();

    let claims = JwtClaims {
        user_id: spec.user_id,
        is_staff: spec.is_staff,
        exp: expiration as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Extracts claims object from JWT token.
/// Requires JWT secret.
/// Failures are reported as 401, never as a server error.
pub fn validate_jwt(token: &str, secret: &str) -> Res<JwtClaims> {
    jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|token_data| token_data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token.".to_string()))
}

/// Token part of an `Authorization` header value.
/// Both `Bearer <token>` and `Token <token>` are accepted.
pub fn token_from_header(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn get_jwt_claims_or_error(req: &ServiceRequest) -> Result<JwtClaims, HttpResponse> {
    if let Some(jwt_claims_res) = req.extensions().get::<Res<JwtClaims>>() {
        match jwt_claims_res {
            Ok(claims) => Ok(claims.clone()),
            Err(app_error) => Err(app_error.to_http_response()),
        }
    } else {
        Err(
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
                .to_http_response(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
        }
    }

    #[test]
    fn issued_token_validates_with_same_secret() {
        let token = generate_jwt(
            ClaimsSpec {
                user_id: 42,
                is_staff: true,
            },
            &config(),
        )
        .unwrap();
        let claims = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, 42);
        assert!(claims.is_staff);
    }

    #[test]
    fn foreign_secret_is_unauthorized() {
        let token = generate_jwt(
            ClaimsSpec {
                user_id: 1,
                is_staff: false,
            },
            &config(),
        )
        .unwrap();
        assert!(matches!(
            validate_jwt(&token, "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(validate_jwt("garbage", "test-secret").is_err());
    }

    #[test]
    fn reads_bearer_and_token_schemes() {
        assert_eq!(token_from_header("Bearer abc"), Some("abc"));
        assert_eq!(token_from_header("Token abc"), Some("abc"));
        assert_eq!(token_from_header("Basic abc"), None);
        assert_eq!(token_from_header("Bearer "), None);
    }
}
