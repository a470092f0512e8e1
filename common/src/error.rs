use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

use crate::validation::FieldErrors;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // === APPLICATION ERRORS ===
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single field-level validation error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let is_dev = cfg!(debug_assertions);

        let to_internal_json = |err_msg: &str| {
            if is_dev {
                serde_json::json!({ "detail": err_msg })
            } else {
                serde_json::json!({ "detail": "Internal server error" })
            }
        };
        let detail = |msg: &str| serde_json::json!({ "detail": msg });

        match self {
            // === CONVERSION ERRORS ===
            AppError::Database(sqlx::Error::RowNotFound) => {
                HttpResponse::NotFound().json(detail("Not found."))
            }
            AppError::Database(sqlx::Error::Database(db_error))
                if db_error.is_unique_violation() =>
            {
                log::warn!("Unique constraint violated: {}", db_error);
                HttpResponse::BadRequest().json(detail("Resource already exists."))
            }
            AppError::Database(error) => {
                log::error!("Database error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::JWT(error) => {
                log::error!("JWT error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Io(error) => {
                log::error!("IO error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }

            // === APPLICATION ERRORS ===
            AppError::Validation(errors) => HttpResponse::BadRequest().json(errors),
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(detail(msg)),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(detail(msg)),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(detail(msg)),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(detail(msg)),
            AppError::TooManyRequests(msg) => HttpResponse::TooManyRequests().json(detail(msg)),

            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(error))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(sqlx::Error::RowNotFound) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Database(sqlx::Error::Database(db_error))
                if db_error.is_unique_violation() =>
            {
                StatusCode::BAD_REQUEST
            }
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::JWT(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}

/// Maps actix body/path/query extraction failures to the same `{"detail": ..}` shape.
pub fn extraction_error(err: impl std::fmt::Display) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}
