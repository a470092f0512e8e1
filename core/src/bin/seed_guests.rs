//! Creates or refreshes the demo accounts used by the frontend's guest login
//! and prints a fresh token for each of them.

use common::env_config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env();
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    let pool = db::setup(&config.database_url, config.is_production())
        .await
        .expect("Failed to set up database");

    for guest in api_auth::guests::GUESTS.iter() {
        match api_auth::guests::ensure_guest(&pool, guest, &config.jwt_config).await {
            Ok(token) => {
                log::info!("Guest '{}' ({}) is ready", guest.username, guest.user_type);
                println!("{}\t{}", guest.username, token);
            }
            Err(err) => {
                log::error!("Failed to seed guest '{}': {}", guest.username, err);
                return Err(std::io::Error::other(err.to_string()));
            }
        }
    }
    Ok(())
}
