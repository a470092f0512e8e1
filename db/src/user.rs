use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{
    dtos::user::{UserCreateRequest, UserUpdateRequest},
    models::user::{AuthCredentials, User},
};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, is_staff, created_at";

pub const USERNAME_UNIQUE_INDEX: &str = "users_username_lower_idx";
pub const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_idx";

/// Turns a lost race on the case-insensitive username/email indexes into the
/// same field error the pre-insert checks report.
fn map_user_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some(USERNAME_UNIQUE_INDEX) => {
                return AppError::field("username", "Username already taken.");
            }
            Some(EMAIL_UNIQUE_INDEX) => return AppError::field("email", "Email already in use."),
            _ => {}
        }
    }
    AppError::from(err)
}

pub async fn exists_user_by_username<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    username: &str,
) -> Res<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))")
        .bind(username)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn exists_user_by_email<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
) -> Res<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
        .bind(email)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
) -> Res<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn find_user_by_username<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    username: &str,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE LOWER(username) = LOWER($1)",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: UserCreateRequest,
) -> Res<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(data.username)
    .bind(data.email)
    .bind(data.password_hash)
    .fetch_one(executor)
    .await
    .map_err(map_user_conflict)
}

pub async fn update_password_hash<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
    password_hash: &str,
) -> Res<()> {
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn update_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
    data: UserUpdateRequest,
) -> Res<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            email = COALESCE($3, email)
        WHERE id = $4
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(data.first_name)
    .bind(data.last_name)
    .bind(data.email)
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(map_user_conflict)
}

pub async fn get_user_with_password_hash<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    username: &str,
) -> Res<Option<(User, AuthCredentials)>> {
    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        user: User,
        password_hash: String,
    }

    let row = sqlx::query_as::<_, Row>(&format!(
        "SELECT {}, password_hash FROM users WHERE LOWER(username) = LOWER($1)",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|record| {
        let credentials = AuthCredentials {
            user_id: record.user.id,
            password_hash: record.password_hash,
        };
        (record.user, credentials)
    }))
}
