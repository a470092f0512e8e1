use common::{
    error::{AppError, Res},
    misc::UserType,
};
use sqlx::{Executor, Postgres};

use crate::{
    dtos::profile::ProfileUpdateRequest,
    models::profile::{Profile, ProfileWithUser},
};

const PROFILE_WITH_USER: &str = r#"
    SELECT p.user_id, u.username, u.first_name, u.last_name, u.email,
           p.file, p.location, p.tel, p.description, p.working_hours, p.type, p.created_at
    FROM profiles p
    JOIN users u ON u.id = p.user_id
"#;

pub async fn get_profile_with_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
) -> Res<Option<ProfileWithUser>> {
    sqlx::query_as::<_, ProfileWithUser>(&format!("{} WHERE p.user_id = $1", PROFILE_WITH_USER))
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_profiles_by_type<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_type: UserType,
) -> Res<Vec<ProfileWithUser>> {
    sqlx::query_as::<_, ProfileWithUser>(&format!(
        "{} WHERE p.type = $1 ORDER BY p.user_id",
        PROFILE_WITH_USER
    ))
    .bind(user_type.as_str())
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

/// Returns the user's profile, creating an empty one first when it is missing.
/// Safe to call repeatedly: the unique `user_id` turns a second insert into a no-op.
pub async fn get_or_create_profile<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
    profile_type: &str,
) -> Res<Profile> {
    sqlx::query_as::<_, Profile>(
        r#"
        WITH inserted AS (
            INSERT INTO profiles (user_id, type)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING *
        )
        SELECT * FROM inserted
        UNION ALL
        SELECT * FROM profiles WHERE user_id = $1
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(profile_type)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_profile<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
    data: ProfileUpdateRequest,
) -> Res<Profile> {
    sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles SET
            file = COALESCE($1, file),
            location = COALESCE($2, location),
            tel = COALESCE($3, tel),
            description = COALESCE($4, description),
            working_hours = COALESCE($5, working_hours),
            type = COALESCE($6, type)
        WHERE user_id = $7
        RETURNING *
        "#,
    )
    .bind(data.file)
    .bind(data.location)
    .bind(data.tel)
    .bind(data.description)
    .bind(data.working_hours)
    .bind(data.profile_type)
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn set_profile_type<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
    user_type: UserType,
) -> Res<()> {
    sqlx::query("UPDATE profiles SET type = $1 WHERE user_id = $2")
        .bind(user_type.as_str())
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Role of a user as recorded on the profile, `None` when there is no profile or no role yet.
pub async fn get_user_type<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
) -> Res<Option<UserType>> {
    let profile_type: Option<String> =
        sqlx::query_scalar("SELECT type FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
    Ok(profile_type.as_deref().and_then(UserType::from_str))
}
