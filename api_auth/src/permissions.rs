use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
    misc::UserType,
};
use sqlx::PgPool;

/// Fails with 403 and `message` unless the user's profile carries `user_type`.
/// A user without a profile is treated like one without a role.
pub async fn require_user_type(
    pool: &PgPool,
    user_id: i64,
    user_type: UserType,
    message: &str,
) -> Res<()> {
    match db::profile::get_user_type(pool, user_id).await? {
        Some(actual) if actual == user_type => Ok(()),
        _ => Err(AppError::Forbidden(message.to_string())),
    }
}

/// Staff status as carried by the token.
pub fn require_staff(claims: &JwtClaims, message: &str) -> Res<()> {
    if claims.is_staff {
        Ok(())
    } else {
        Err(AppError::Forbidden(message.to_string()))
    }
}
