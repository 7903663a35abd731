use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

use gamedock_server::config::AppSettings;
use gamedock_server::db::connection::{create_pool, run_migrations, verify_connection};
use gamedock_server::db::repositories::RoleRepository;
use gamedock_server::db::seed;
use gamedock_server::routes::{self, AppContext};
use gamedock_server::services::auth::permissions::PermissionService;
use gamedock_server::services::auth::tokens::TokenService;
use gamedock_server::services::sessions::{NoopSessionStore, RedisSessionStore, SessionStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load application settings
    let app_settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };

    // Database connection setup
    let db_pool = match create_pool(&app_settings.database.url).await {
        Ok(pool) => {
            if let Err(e) = verify_connection(&pool).await {
                log::error!("Database connection verification failed: {}", e);
                log::error!("Cannot start server without a working database connection");
                std::process::exit(1);
            }
            pool
        }
        Err(e) => {
            log::error!("Failed to create database connection pool: {}", e);
            log::error!("Cannot start server without a working database connection");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&db_pool).await {
        log::error!("Failed to apply database migrations: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = seed::seed(&db_pool).await {
        log::error!("Failed to seed reference data: {}", e);
        std::process::exit(1);
    }

    // Session store: Redis when configured, otherwise a no-op store that
    // leaves tokens revocable only by expiry.
    let session_store: Arc<dyn SessionStore> = match &app_settings.redis.url {
        Some(url) => match RedisSessionStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::warn!("Failed to connect to Redis at startup: {}", e);
                log::warn!("Continuing without session revocation; tokens expire naturally");
                Arc::new(NoopSessionStore)
            }
        },
        None => {
            log::warn!("REDIS_URL not set; session revocation is disabled");
            Arc::new(NoopSessionStore)
        }
    };

    let token_service = Arc::new(TokenService::from_config(&app_settings.jwt));
    let permission_service = Arc::new(PermissionService::new(RoleRepository::new(db_pool.clone())));

    let ctx = AppContext {
        tokens: token_service,
        sessions: session_store,
        permissions: permission_service,
    };

    let host = app_settings.server.host.clone();
    let port = app_settings.server.port;
    log::info!("Starting server at http://{}:{}", host, port);

    HttpServer::new(move || {
        let app_settings = app_settings.clone();
        let ctx = ctx.clone();

        // Configure CORS using actix-cors
        let mut cors = Cors::default().supports_credentials();
        if app_settings.server.cors_origins.contains(&"*".to_string()) {
            cors = cors.allow_any_origin();
        } else {
            for origin in &app_settings.server.cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_settings.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::from(ctx.tokens.clone()))
            .app_data(web::Data::from(ctx.sessions.clone()))
            .app_data(web::Data::from(ctx.permissions.clone()))
            .configure(|cfg| routes::configure_routes(cfg, &ctx))
    })
    .bind((host, port))?
    .run()
    .await
}
