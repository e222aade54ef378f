use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::db::Store;
use crate::error::AppError;
use crate::routes::ok;
use crate::AppState;

/// What anonymous clients may know about the platform switches.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicSettings {
    maintenance_mode: bool,
    maintenance_message: String,
    allow_registrations: bool,
}

pub async fn public_settings<S: Store>(
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, AppError> {
    let settings = state.store.load_settings().await?;
    Ok(ok(PublicSettings {
        maintenance_mode: settings.maintenance_mode,
        maintenance_message: settings.maintenance_message,
        allow_registrations: settings.allow_registrations,
    }))
}
