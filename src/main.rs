use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use book_user_api::auth::JwtService;
use book_user_api::config::load_config;
use book_user_api::mail::mailer_from_config;
use book_user_api::postgres::config::{create_pool, health_check};
use book_user_api::types::{AppConfig, StartupError};
use book_user_api::user::repository::PgUserStore;
use book_user_api::user::service::UserService;
use book_user_api::user::AppState;
use book_user_api::utils::password::security::hasher_from_config;

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    let config = load_config()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log.level))
        .init();

    run(config).await.inspect_err(|err| log::error!("{}", err))
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let pool = create_pool(&config.database)?;
    health_check(&pool).await?;
    log::info!("Database connection established");

    let store = PgUserStore::new(pool);
    if config.database.auto_migrate {
        store.init_schema().await.map_err(|e| StartupError::Database(e.to_string()))?;
    }

    let hasher =
        hasher_from_config(&config.password).map_err(|e| StartupError::Config(e.to_string()))?;
    let mailer = mailer_from_config(&config.mail).map_err(|e| StartupError::Config(e.to_string()))?;

    let state = web::Data::new(AppState::new(
        UserService::new(Arc::new(store), hasher),
        JwtService::from_config(&config.jwt),
        mailer,
        config.password.reset_default.clone(),
    ));

    let cors_origins = config.server.cors_origins.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(build_cors(&cors_origins))
            .wrap(Logger::default())
            .configure(book_user_api::configure)
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let bind_address = (config.server.host.as_str(), config.server.port);
    log::info!("Listening on {}:{}", bind_address.0, bind_address.1);

    server
        .bind(bind_address)
        .map_err(|e| StartupError::ServerBind(e.to_string()))?
        .run()
        .await
        .map_err(|e| StartupError::ServerBind(e.to_string()))
}

fn build_cors(origins: &[String]) -> Cors {
    if origins.iter().any(|origin| origin == "*") {
        return Cors::permissive();
    }

    origins.iter().fold(Cors::default().allow_any_method().allow_any_header(), |cors, origin| {
        cors.allowed_origin(origin)
    })
}
