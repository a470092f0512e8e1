//! Demo accounts used by the frontend's guest login.

use common::{
    env_config::JwtConfig,
    error::Res,
    misc::UserType,
};
use db::dtos::user::UserCreateRequest;
use sqlx::PgPool;

use crate::services::{auth, password};

pub struct GuestAccount {
    pub username: &'static str,
    pub password: &'static str,
    pub email: &'static str,
    pub user_type: UserType,
}

pub const GUESTS: [GuestAccount; 2] = [
    GuestAccount {
        username: "andrey",
        password: "asdasd",
        email: "andrey@example.com",
        user_type: UserType::Customer,
    },
    GuestAccount {
        username: "kevin",
        password: "asdasd24",
        email: "kevin@example.com",
        user_type: UserType::Business,
    },
];

/// Creates the guest user if needed, resets its password and profile type and
/// returns a fresh token for it. Running it again is harmless.
pub async fn ensure_guest(pool: &PgPool, guest: &GuestAccount, jwt_config: &JwtConfig) -> Res<String> {
    let password_hash = password::hash_password(guest.password)?;

    let mut tx = pool.begin().await?;

    let user = match db::user::find_user_by_username(&mut *tx, guest.username).await? {
        Some(user) => {
            log::info!("User '{}' already exists", user.username);
            db::user::update_password_hash(&mut *tx, user.id, &password_hash).await?;
            user
        }
        None => {
            let user = db::user::insert_user(
                &mut *tx,
                UserCreateRequest {
                    username: guest.username.to_string(),
                    email: guest.email.to_string(),
                    password_hash,
                },
            )
            .await?;
            log::info!("Created user '{}'", user.username);
            user
        }
    };

    let profile = db::profile::get_or_create_profile(&mut *tx, user.id, guest.user_type.as_str()).await?;
    if profile.profile_type != guest.user_type.as_str() {
        db::profile::set_profile_type(&mut *tx, user.id, guest.user_type).await?;
    }

    tx.commit().await?;

    let response = auth::auth_response(&user, jwt_config)?;
    Ok(response.token)
}
