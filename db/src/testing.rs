//! Throwaway PostgreSQL for integration tests.
//!
//! Starts `postgres:16` through testcontainers and applies the migrations.
//! Docker has to be reachable from the test process.

use std::time::Duration;

use common::misc::UserType;
use sqlx::PgPool;
use testcontainers::{
    ContainerAsync, GenericImage, ImageExt,
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
};

use crate::{dtos::user::UserCreateRequest, models::user::User};

/// Starts a migrated database. Keep the container alive for as long as the pool is used.
pub async fn start_postgres() -> (ContainerAsync<GenericImage>, PgPool) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(5432.tcp())
        .with_wait_for(WaitFor::message_on_stdout(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_USER", "market")
        .with_env_var("POSTGRES_PASSWORD", "market")
        .with_env_var("POSTGRES_DB", "market")
        .with_startup_timeout(Duration::from_secs(60))
        .start()
        .await
        .expect("Failed to start postgres container");

    // the ready line is printed once during init and again when the server is up
    tokio::time::sleep(Duration::from_secs(1)).await;

    let host = container
        .get_host()
        .await
        .expect("Failed to get container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get mapped port");

    let pool = PgPool::connect(&format!("postgres://market:market@{}:{}/market", host, port))
        .await
        .expect("Failed to connect to PostgreSQL");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    (container, pool)
}

/// Inserts a user together with a profile of the given type.
pub async fn create_user(pool: &PgPool, username: &str, user_type: Option<UserType>) -> User {
    let user = crate::user::insert_user(
        pool,
        UserCreateRequest {
            username: username.to_string(),
            email: format!("{}@mail.de", username),
            password_hash: "unused".to_string(),
        },
    )
    .await
    .expect("Failed to insert user");

    let profile_type = user_type.map(|t| t.as_str()).unwrap_or_default();
    crate::profile::get_or_create_profile(pool, user.id, profile_type)
        .await
        .expect("Failed to create profile");

    user
}
