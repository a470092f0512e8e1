use common::{
    env_config::JwtConfig,
    error::{AppError, Res},
    jwt::{self, ClaimsSpec},
    misc::{self, UserType},
    validation::FieldErrors,
};
use db::{dtos::user::UserCreateRequest, models::user::User};
use sqlx::PgPool;

use crate::{
    dtos::auth::{AuthResponse, LoginRequest, RegistrationRequest},
    services::password,
};

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 6;

const REQUIRED: &str = "This field is required.";

/// Registration payload after the checks that need no database.
#[derive(Debug)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub user_type: UserType,
}

fn required<'a>(errors: &mut FieldErrors, field: &str, value: &'a Option<String>) -> Option<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => value.as_deref(),
        _ => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Checks the shape of a registration payload. Every failing field is reported,
/// not just the first one.
pub fn validate_registration(req: &RegistrationRequest) -> Res<ValidRegistration> {
    let mut errors = FieldErrors::new();

    let username = required(&mut errors, "username", &req.username);
    if let Some(username) = username {
        if username.chars().count() > USERNAME_MAX_LENGTH {
            errors.add(
                "username",
                format!("Ensure this field has no more than {} characters.", USERNAME_MAX_LENGTH),
            );
        } else if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
    }

    let email = required(&mut errors, "email", &req.email).map(str::trim);
    if let Some(email) = email {
        if !misc::is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }

    let password = required(&mut errors, "password", &req.password);
    for (field, value) in [("password", password), ("repeated_password", req.repeated_password.as_deref())] {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            if value.chars().count() < PASSWORD_MIN_LENGTH {
                errors.add(
                    field,
                    format!("Ensure this field has at least {} characters.", PASSWORD_MIN_LENGTH),
                );
            }
        }
    }
    let repeated = required(&mut errors, "repeated_password", &req.repeated_password);
    if let (Some(password), Some(repeated)) = (password, repeated) {
        if password != repeated {
            errors.add("repeated_password", "Passwords do not match.");
        }
    }

    let user_type = match required(&mut errors, "type", &req.user_type) {
        Some(raw) => match UserType::from_str(raw) {
            Some(user_type) => Some(user_type),
            None => {
                errors.add("type", format!("\"{}\" is not a valid choice.", raw));
                None
            }
        },
        None => None,
    };

    errors.into_result()?;

    match (username, email, password, user_type) {
        (Some(username), Some(email), Some(password), Some(user_type)) => Ok(ValidRegistration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            user_type,
        }),
        _ => Err(AppError::Internal("Registration passed validation incomplete".to_string())),
    }
}

/// Issues a signed token for the user and wraps it in the auth response.
pub fn auth_response(user: &User, jwt_config: &JwtConfig) -> Res<AuthResponse> {
    let token = jwt::generate_jwt(
        ClaimsSpec {
            user_id: user.id,
            is_staff: user.is_staff,
        },
        jwt_config,
    )?;
    Ok(AuthResponse {
        token,
        username: user.username.clone(),
        email: user.email.clone(),
        user_id: user.id,
    })
}

/// Creates a user with hashed credentials and a profile of the requested type.
///
/// # Arguments
///
/// * `pool` - A reference to the database connection pool.
/// * `req` - The registration payload.
///
/// # Returns
///
/// The created `User`, or a field-level validation error when the payload is
/// malformed or the username/email is already taken.
pub async fn register_user(pool: &PgPool, req: &RegistrationRequest) -> Res<User> {
    let valid = validate_registration(req)?;

    let mut errors = FieldErrors::new();
    if db::user::exists_user_by_username(pool, &valid.username).await? {
        errors.add("username", "Username already taken.");
    }
    if db::user::exists_user_by_email(pool, &valid.email).await? {
        errors.add("email", "Email already in use.");
    }
    errors.into_result()?;

    let password_hash = password::hash_password(&valid.password)?;

    let mut tx = pool.begin().await?;

    let user = db::user::insert_user(
        &mut *tx,
        UserCreateRequest {
            username: valid.username,
            email: valid.email,
            password_hash,
        },
    )
    .await?;

    db::profile::get_or_create_profile(&mut *tx, user.id, valid.user_type.as_str()).await?;

    tx.commit().await?;
    log::info!("Registered {} user {}", valid.user_type, user.id);
    Ok(user)
}

/// Authenticates existing user.
/// Unknown usernames and wrong passwords are indistinguishable to the caller.
///
/// # Arguments
///
/// * `pool` - A reference to the database connection pool.
/// * `login_data` - The login data.
///
/// # Returns
///
/// A `Result` containing the `User` object or an `AppError` if an error occurs.
pub async fn authenticate_user(pool: &PgPool, login_data: &LoginRequest) -> Res<User> {
    let mut errors = FieldErrors::new();
    let username = required(&mut errors, "username", &login_data.username);
    let password = required(&mut errors, "password", &login_data.password);
    errors.into_result()?;

    let (Some(username), Some(password)) = (username, password) else {
        return Err(invalid_credentials());
    };

    let Some((user, credentials)) = db::user::get_user_with_password_hash(pool, username).await?
    else {
        return Err(invalid_credentials());
    };

    if password::verify_password(password, &credentials.password_hash) {
        Ok(user)
    } else {
        Err(invalid_credentials())
    }
}

fn invalid_credentials() -> AppError {
    AppError::field("detail", "Invalid Credentials")
}
