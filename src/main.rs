use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use globetrotter_api::config::{Config, StorageBackend};
use globetrotter_api::db::memory::MemoryStore;
use globetrotter_api::db::mongo::{connect_with_retry, MongoStore, CONNECT_ATTEMPTS, CONNECT_BACKOFF};
use globetrotter_api::db::Store;
use globetrotter_api::{configure_app, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    log::info!("Application starting...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    match config.storage {
        StorageBackend::Mongo => {
            let uri = config.mongo_uri.clone().unwrap_or_default();
            let client = match connect_with_retry(&uri, CONNECT_ATTEMPTS, CONNECT_BACKOFF).await {
                Ok(client) => client,
                Err(err) => {
                    log::error!("Could not connect to MongoDB: {}", err);
                    std::process::exit(1);
                }
            };
            let store = MongoStore::new(&client, &config.database_name);
            if let Err(err) = store.ensure_indexes().await {
                log::error!("Failed to create indexes: {}", err);
                std::process::exit(1);
            }
            run(store, config).await
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage; data is lost on shutdown");
            run(MemoryStore::new(), config).await
        }
    }
}

async fn run<S: Store>(store: S, config: Config) -> std::io::Result<()> {
    let host = config.host.clone();
    let port = config.port;
    let state = web::Data::new(AppState::new(store, config));

    if let Some(admin) = state.config.admin.as_ref() {
        match state.auth().bootstrap_admin(admin).await {
            Ok(true) => log::info!("Created superadmin {}", admin.email),
            Ok(false) => log::debug!("Superadmin {} already exists", admin.email),
            Err(err) => log::error!("Failed to bootstrap superadmin: {}", err),
        }
    }

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&state.config.client_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_app(state.clone()))
    })
    .bind((host, port))?
    .run()
    .await
}
