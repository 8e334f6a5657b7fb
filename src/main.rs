use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use migration::{Migrator, MigratorTrait};
use musefolio_backend::auth::jwks::JwksCache;
use musefolio_backend::auth::jwt::TokenVerifier;
use musefolio_backend::cache::RedisCache;
use musefolio_backend::config::{AppConfig, AuthConfig};
use musefolio_backend::create_pool;
use musefolio_backend::db::PgPortfolioStore;
use musefolio_backend::handlers;
use musefolio_backend::services::PortfolioService;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let db = create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Database ready");

    // Initialize Redis cache
    let redis_cache = RedisCache::new(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");
    let redis_data = web::Data::new(Arc::new(redis_cache));
    tracing::info!("Connected to Redis");

    let verifier = match &config.auth {
        AuthConfig::Jwks { base_url, anon_key } => {
            TokenVerifier::Jwks(JwksCache::new(base_url, anon_key))
        }
        AuthConfig::Secret(secret) => TokenVerifier::Secret(secret.clone()),
    };
    tracing::info!("Verifying tokens with the {} provider", verifier.provider());
    let verifier_data = web::Data::new(verifier);

    let store = Arc::new(PgPortfolioStore::new(db.clone()));
    let service_data = web::Data::new(PortfolioService::new(
        store,
        config.media_url_prefix.clone(),
    ));
    let db_data = web::Data::new(db);

    std::fs::create_dir_all(&config.media_dir)?;

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Server running at http://{bind_addr}");

    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(web::PayloadConfig::new(config_data.max_upload_bytes))
            .app_data(db_data.clone())
            .app_data(redis_data.clone())
            .app_data(verifier_data.clone())
            .app_data(service_data.clone())
            .app_data(config_data.clone())
            .route("/health", web::get().to(handlers::health::health))
            .service(web::scope("/api/v1").configure(handlers::init_routes))
            .service(Files::new(&config_data.media_url_prefix, &config_data.media_dir))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
