mod cors;

use actix_web::{
    App, HttpServer,
    http::Method,
    web::{self},
};
use common::{env_config::Config, error::extraction_error};

/// Every route reachable without a token.
fn public_routes() -> Vec<(Method, &'static str)> {
    [
        api_auth::PUBLIC_ROUTES,
        api_offers::PUBLIC_ROUTES,
        api_info::PUBLIC_ROUTES,
    ]
    .concat()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let is_production = config.is_production();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, is_production)
        .await
        .expect("Failed to set up database");

    // uploaded avatars are served from here
    std::fs::create_dir_all(&config.media_root)?;

    // one budget for all workers
    let limiter = limiter::global_middleware(config.rate_limit_per_second);

    log::info!(
        "Starting marketplace on {}:{} ({} workers)",
        config.server_host,
        config.server_port,
        config.num_workers
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _| extraction_error(err)))
            .app_data(web::PathConfig::default().error_handler(|err, _| extraction_error(err)))
            .app_data(web::QueryConfig::default().error_handler(|err, _| extraction_error(err)))
            .wrap(limiter.clone()) // 4th
            .wrap(logger::middleware()) // 3rd
            .wrap(extractor::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(actix_files::Files::new(
                &config_data.media_url,
                &config_data.media_root,
            ))
            .service(
                web::scope("/api")
                    .wrap(api_auth::auth_middleware(public_routes()))
                    .configure(api_auth::mount_auth)
                    .configure(api_auth::mount_user)
                    .configure(api_profiles::mount_profiles)
                    .configure(api_offers::mount_offers)
                    .configure(api_orders::mount_orders)
                    .configure(api_reviews::mount_reviews)
                    .configure(api_info::mount_info),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
