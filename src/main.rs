use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;

use todo_api::{auth::TokenVerifier, config::Config, db, routes};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let pool = db::connect(&config).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    if db::check_connection(&pool).await && config.run_migrations {
        db::run_migrations(&pool)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    }

    let verifier = web::Data::new(TokenVerifier::from_config(&config));
    let pool_data = web::Data::new(pool.clone());
    let config_data = web::Data::new(config.clone());

    log::info!("Starting {} at {}", config.app_name, config.server_url());
    HttpServer::new(move || {
        let api_prefix = config_data.api_prefix.clone();
        App::new()
            .app_data(pool_data.clone())
            .app_data(verifier.clone())
            .app_data(config_data.clone())
            .wrap(routes::cors(&config_data))
            .wrap(Logger::default())
            .configure(move |cfg| routes::config(cfg, &api_prefix))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    db::close(&pool).await;
    Ok(())
}
