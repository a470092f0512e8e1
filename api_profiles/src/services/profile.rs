use common::{
    env_config::Config,
    error::{AppError, Res},
    misc::{self, UserType},
    validation::FieldErrors,
};
use db::{
    dtos::{profile::ProfileUpdateRequest, user::UserUpdateRequest},
    models::profile::ProfileWithUser,
};
use sqlx::PgPool;

use crate::{
    dtos::profile::{
        AvatarUpload, BusinessProfileItem, CustomerProfileItem, ProfilePatch, ProfileResponse,
    },
    services::avatar,
};

const FILE_MAX_CHARS: usize = 255;

const LIMITS: [(&str, usize); 7] = [
    ("first_name", 150),
    ("last_name", 150),
    ("email", 254),
    ("file", FILE_MAX_CHARS),
    ("location", 255),
    ("tel", 50),
    ("working_hours", 50),
];

fn field_value<'a>(patch: &'a ProfilePatch, field: &str) -> Option<&'a str> {
    match field {
        "first_name" => patch.first_name.as_deref(),
        "last_name" => patch.last_name.as_deref(),
        "email" => patch.email.as_deref(),
        "file" => patch.file.as_deref(),
        "location" => patch.location.as_deref(),
        "tel" => patch.tel.as_deref(),
        "working_hours" => patch.working_hours.as_deref(),
        _ => None,
    }
}

/// Field checks of a profile patch that need no database.
pub fn validate_patch(patch: &ProfilePatch) -> Res<()> {
    let mut errors = FieldErrors::new();

    for (field, max) in LIMITS {
        if let Some(value) = field_value(patch, field) {
            if value.chars().count() > max {
                errors.add(
                    field,
                    format!("Ensure this field has no more than {} characters.", max),
                );
            }
        }
    }

    if let Some(email) = patch.email.as_deref().filter(|e| !e.is_empty()) {
        if !misc::is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }

    if let Some(profile_type) = patch.profile_type.as_deref().filter(|t| !t.is_empty()) {
        if UserType::from_str(profile_type).is_none() {
            errors.add("type", format!("\"{}\" is not a valid choice.", profile_type));
        }
    }

    errors.into_result()
}

/// Only the owner may write a profile, whether it already exists or not.
pub fn ensure_owner(caller_id: i64, user_id: i64) -> Res<()> {
    if caller_id != user_id {
        return Err(AppError::Forbidden(
            "You are only allowed to update your own profile.".to_string(),
        ));
    }
    Ok(())
}

pub async fn get_profile(pool: &PgPool, user_id: i64) -> Res<ProfileResponse> {
    db::profile::get_profile_with_user(pool, user_id)
        .await?
        .map(ProfileResponse::from)
        .ok_or_else(|| AppError::NotFound("No Profile matches the given query.".to_string()))
}

/// Applies a partial update to the caller's own profile, creating the profile
/// first when the user has none yet.
///
/// An uploaded avatar is written before the transaction starts and removed again
/// when the update fails. A previously stored avatar that is no longer referenced
/// is deleted after the commit.
///
/// # Arguments
///
/// * `pool` - A reference to the database connection pool.
/// * `config` - Media settings used to store an uploaded avatar.
/// * `origin` - Scheme and host of the request, used for the absolute avatar URL.
/// * `caller_id` - Authenticated user.
/// * `user_id` - Owner of the profile addressed by the path.
/// * `patch` - Fields to change.
/// * `upload` - Avatar image from a multipart request. Takes precedence over a `file` URL.
///
/// # Returns
///
/// The full profile representation after the update.
pub async fn update_profile(
    pool: &PgPool,
    config: &Config,
    origin: &str,
    caller_id: i64,
    user_id: i64,
    mut patch: ProfilePatch,
    upload: Option<AvatarUpload>,
) -> Res<ProfileResponse> {
    ensure_owner(caller_id, user_id)?;
    validate_patch(&patch)?;

    let stored = match upload {
        Some(upload) => {
            let extension = avatar::validate_avatar(&upload)?;
            let relative = avatar::avatar_path(user_id, extension);
            let url = avatar::avatar_url(origin, &config.media_url, &relative);
            if url.chars().count() > FILE_MAX_CHARS {
                return Err(AppError::field(
                    "file",
                    format!("Ensure this field has no more than {} characters.", FILE_MAX_CHARS),
                ));
            }
            avatar::store_avatar(&config.media_root, &relative, &upload.bytes).await?;
            patch.file = Some(url);
            Some(relative)
        }
        None => None,
    };

    match write_profile(pool, user_id, patch).await {
        Ok((profile, previous_file)) => {
            if previous_file != profile.file {
                if let Some(old) =
                    avatar::stored_avatar_path(&previous_file, &config.media_url, user_id)
                {
                    avatar::remove_avatar(&config.media_root, &old).await;
                }
            }
            Ok(profile.into())
        }
        Err(e) => {
            if let Some(relative) = stored {
                avatar::remove_avatar(&config.media_root, &relative).await;
            }
            Err(e)
        }
    }
}

/// Runs the profile and user updates in one transaction and returns the updated
/// profile along with the `file` it referenced before.
async fn write_profile(
    pool: &PgPool,
    user_id: i64,
    patch: ProfilePatch,
) -> Res<(ProfileWithUser, String)> {
    let mut tx = pool.begin().await?;

    let previous = db::profile::get_or_create_profile(&mut *tx, user_id, "").await?;

    let user_update = UserUpdateRequest {
        first_name: patch.first_name,
        last_name: patch.last_name,
        email: patch.email,
    };
    if !user_update.is_empty() {
        db::user::update_user(&mut *tx, user_id, user_update).await?;
    }

    db::profile::update_profile(
        &mut *tx,
        user_id,
        ProfileUpdateRequest {
            file: patch.file,
            location: patch.location,
            tel: patch.tel,
            description: patch.description,
            working_hours: patch.working_hours,
            profile_type: patch.profile_type,
        },
    )
    .await?;

    let profile = db::profile::get_profile_with_user(&mut *tx, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Profile vanished during update".to_string()))?;

    tx.commit().await?;
    Ok((profile, previous.file))
}

pub async fn get_business_profiles(pool: &PgPool) -> Res<Vec<BusinessProfileItem>> {
    let profiles = db::profile::get_profiles_by_type(pool, UserType::Business).await?;
    Ok(profiles.into_iter().map(BusinessProfileItem::from).collect())
}

pub async fn get_customer_profiles(pool: &PgPool) -> Res<Vec<CustomerProfileItem>> {
    let profiles = db::profile::get_profiles_by_type(pool, UserType::Customer).await?;
    Ok(profiles.into_iter().map(CustomerProfileItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_may_write() {
        assert!(ensure_owner(4, 4).is_ok());
        assert!(matches!(ensure_owner(4, 5), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn validates_email_type_and_lengths() {
        let ok = ProfilePatch {
            email: Some(String::new()),
            profile_type: Some("business".into()),
            location: Some("Berlin".into()),
            ..Default::default()
        };
        assert!(validate_patch(&ok).is_ok());

        let bad = ProfilePatch {
            email: Some("nope".into()),
            profile_type: Some("admin".into()),
            tel: Some("1".repeat(51)),
            ..Default::default()
        };
        match validate_patch(&bad) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.contains("email"));
                assert!(errors.contains("type"));
                assert!(errors.contains("tel"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    fn png(bytes: &[u8]) -> AvatarUpload {
        AvatarUpload {
            content_type: Some("image/png".to_string()),
            bytes: bytes.to_vec(),
            truncated: false,
        }
    }

    fn media_config() -> (Config, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("profile-test-{}", uuid::Uuid::new_v4().simple()));
        let mut config = (*Config::for_tests()).clone();
        config.media_root = root.to_string_lossy().to_string();
        (config, root)
    }

    fn stored_files(root: &std::path::Path, user_id: i64) -> usize {
        std::fs::read_dir(root.join(format!("avatars/{}", user_id)))
            .map(|dir| dir.count())
            .unwrap_or(0)
    }

    #[actix_web::test]
    async fn replacing_an_avatar_keeps_one_file() {
        let (_container, pool) = db::testing::start_postgres().await;
        let (config, root) = media_config();
        let origin = "http://localhost:8000";
        let user = db::testing::create_user(&pool, "anna", None).await;
        sqlx::query("DELETE FROM profiles WHERE user_id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        // the missing profile is created on the first write
        let first = update_profile(
            &pool,
            &config,
            origin,
            user.id,
            user.id,
            ProfilePatch {
                location: Some("Berlin".into()),
                ..Default::default()
            },
            Some(png(b"first")),
        )
        .await
        .unwrap();
        assert!(first.file.starts_with("http://localhost:8000/media/avatars/"));
        assert_eq!(first.location, "Berlin");
        assert_eq!(stored_files(&root, user.id), 1);

        let second = update_profile(
            &pool,
            &config,
            origin,
            user.id,
            user.id,
            ProfilePatch::default(),
            Some(png(b"second")),
        )
        .await
        .unwrap();
        assert_ne!(second.file, first.file);
        assert_eq!(second.location, "Berlin");
        assert_eq!(stored_files(&root, user.id), 1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[actix_web::test]
    async fn failed_update_leaves_no_avatar_behind() {
        let (_container, pool) = db::testing::start_postgres().await;
        let (config, root) = media_config();
        let anna = db::testing::create_user(&pool, "anna", None).await;
        let ben = db::testing::create_user(&pool, "ben", None).await;

        let result = update_profile(
            &pool,
            &config,
            "http://localhost:8000",
            ben.id,
            ben.id,
            ProfilePatch {
                email: Some(anna.email.to_uppercase()),
                ..Default::default()
            },
            Some(png(b"avatar")),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(ref e)) if e.contains("email")));
        assert_eq!(stored_files(&root, ben.id), 0);

        let profile = get_profile(&pool, ben.id).await.unwrap();
        assert_eq!(profile.file, "");
        assert_eq!(profile.email, ben.email);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
