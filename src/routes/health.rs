use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::HashMap;
use std::env;

use crate::db::Store;
use crate::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check<S: Store>(state: web::Data<AppState<S>>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let database = check_database(&state.store).await;
    if database.status != "ok" {
        health.status = "degraded".to_string();
    }
    health.services.insert("database".to_string(), database);

    if health.status == "ok" {
        HttpResponse::Ok().json(health)
    } else {
        HttpResponse::ServiceUnavailable().json(health)
    }
}

async fn check_database<S: Store>(store: &S) -> ServiceStatus {
    match store.load_settings().await {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: None,
        },
        Err(e) => {
            log::error!("Health check database error: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some("Database unreachable".to_string()),
            }
        }
    }
}
