pub mod admin;
pub mod auth;
pub mod cities;
pub mod dashboard;
pub mod health;
pub mod profile;
pub mod settings;
pub mod trips;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::db::Store;

/// Success envelope. Errors use the body produced by `AppError`.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        message: None,
        data: Some(data),
    })
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse {
        success: true,
        message: None,
        data: Some(data),
    })
}

pub fn ok_message(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::<()> {
        success: true,
        message: Some(message.to_string()),
        data: None,
    })
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        message: Some(message.to_string()),
        data: Some(data),
    })
}

pub fn configure<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check::<S>))
        .service(
            web::scope("/api")
                .route("/settings", web::get().to(settings::public_settings::<S>))
                .configure(auth::config::<S>)
                .configure(cities::config::<S>)
                .configure(trips::config::<S>)
                .configure(profile::config::<S>)
                .configure(dashboard::config::<S>)
                .configure(admin::config::<S>),
        );
}
