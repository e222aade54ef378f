pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod sanitize;
pub mod services;

use actix_web::{error::InternalError, web, HttpRequest};

use crate::config::Config;
use crate::db::Store;
use crate::error::AppError;
use crate::services::admin_service::AdminService;
use crate::services::auth_service::AuthService;
use crate::services::catalog_service::CatalogService;
use crate::services::profile_service::ProfileService;
use crate::services::stats_service::StatsService;
use crate::services::token_service::TokenService;
use crate::services::trip_service::TripService;

/// Shared by every worker. Handlers borrow a service for one request.
pub struct AppState<S: Store> {
    pub store: S,
    pub tokens: TokenService,
    pub config: Config,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            tokens: TokenService::new(&config),
            store,
            config,
        }
    }

    pub fn auth(&self) -> AuthService<'_, S> {
        AuthService::new(&self.store, &self.tokens, self.config.bcrypt_cost)
    }

    pub fn trips(&self) -> TripService<'_, S> {
        TripService::new(&self.store)
    }

    pub fn profile(&self) -> ProfileService<'_, S> {
        ProfileService::new(&self.store, &self.tokens, self.config.bcrypt_cost)
    }

    pub fn stats(&self) -> StatsService<'_, S> {
        StatsService::new(&self.store)
    }

    pub fn catalog(&self) -> CatalogService<'_, S> {
        CatalogService::new(&self.store)
    }

    pub fn admin(&self) -> AdminService<'_, S> {
        AdminService::new(&self.store)
    }
}

fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = actix_web::ResponseError::error_response(&AppError::BadRequest(format!(
        "Invalid JSON body: {}",
        err
    )));
    InternalError::from_response(err, response).into()
}

fn query_error(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = actix_web::ResponseError::error_response(&AppError::BadRequest(format!(
        "Invalid query string: {}",
        err
    )));
    InternalError::from_response(err, response).into()
}

/// Registers shared state, extractor error handlers and every route.
pub fn configure_app<S: Store>(
    state: web::Data<AppState<S>>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state.tokens.clone()))
            .app_data(state)
            .app_data(
                web::JsonConfig::default()
                    .limit(1024 * 1024)
                    .error_handler(json_error),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .configure(routes::configure::<S>);
    }
}
