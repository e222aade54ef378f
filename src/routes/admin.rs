use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::commands::admin::{
    CatalogCityRequest, UpdateRoleRequest, UpdateSettingsRequest, UpdateStatusRequest,
};
use crate::commands::query::{TripListParams, UserListParams};
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::middleware::role_auth::RequireRole;
use crate::models::catalog::CatalogCityView;
use crate::models::pagination::Paginated;
use crate::models::trip::{TripQuery, TripView};
use crate::models::user::{UserRole, UserView};
use crate::routes::{created, ok, ok_message};
use crate::AppState;

/// The last `wrap` runs first, so tokens are decoded before the role check.
pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(RequireRole::new(UserRole::Admin))
            .wrap(AuthMiddleware)
            .route("/stats", web::get().to(platform_stats::<S>))
            .route("/users", web::get().to(list_users::<S>))
            .route("/users/{id}", web::get().to(get_user::<S>))
            .route("/users/{id}", web::delete().to(delete_user::<S>))
            .route("/users/{id}/role", web::put().to(update_user_role::<S>))
            .route("/users/{id}/status", web::put().to(update_user_status::<S>))
            .route("/trips", web::get().to(list_trips::<S>))
            .route("/trips/{id}", web::delete().to(delete_trip::<S>))
            .route("/cities", web::post().to(create_city::<S>))
            .route("/cities/{id}", web::put().to(update_city::<S>))
            .route("/cities/{id}", web::delete().to(delete_city::<S>))
            .route("/settings", web::get().to(get_settings::<S>))
            .route("/settings", web::put().to(update_settings::<S>)),
    );
}

/*
    /api/admin/stats
*/
pub async fn platform_stats<S: Store>(
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, AppError> {
    Ok(ok(state.stats().platform().await?))
}

/*
    /api/admin/users?page&limit&search&role
*/
pub async fn list_users<S: Store>(
    state: web::Data<AppState<S>>,
    params: web::Query<UserListParams>,
) -> Result<HttpResponse, AppError> {
    let (query, page) = params.into_inner().decode()?;
    let (users, total) = state.admin().list_users(&query, page).await?;
    let items = users.iter().map(UserView::from).collect();
    Ok(ok(Paginated::new(items, page, total)))
}

pub async fn get_user<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = state.admin().get_user(&path.into_inner()).await?;
    Ok(ok(UserView::from(&user)))
}

pub async fn delete_user<S: Store>(
    state: web::Data<AppState<S>>,
    actor: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state
        .admin()
        .delete_user(&actor, &path.into_inner())
        .await?;
    Ok(ok_message("User deleted"))
}

/*
    /api/admin/users/{id}/role
*/
pub async fn update_user_role<S: Store>(
    state: web::Data<AppState<S>>,
    actor: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let role = body.into_inner().into_role()?;
    let user = state
        .admin()
        .update_role(&actor, &path.into_inner(), role)
        .await?;
    Ok(ok(UserView::from(&user)))
}

/*
    /api/admin/users/{id}/status
*/
pub async fn update_user_status<S: Store>(
    state: web::Data<AppState<S>>,
    actor: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .admin()
        .set_active(&actor, &path.into_inner(), body.is_active)
        .await?;
    Ok(ok(UserView::from(&user)))
}

/*
    /api/admin/trips?page&limit&status&search
*/
pub async fn list_trips<S: Store>(
    state: web::Data<AppState<S>>,
    params: web::Query<TripListParams>,
) -> Result<HttpResponse, AppError> {
    let (query, page) = params.into_inner().decode(TripQuery::default())?;
    let (trips, total) = state.admin().list_trips(&query, page).await?;
    let now = Utc::now();
    let items = trips.into_iter().map(|t| TripView::new(t, now)).collect();
    Ok(ok(Paginated::new(items, page, total)))
}

pub async fn delete_trip<S: Store>(
    state: web::Data<AppState<S>>,
    actor: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state
        .admin()
        .delete_trip(&actor, &path.into_inner())
        .await?;
    Ok(ok_message("Trip deleted"))
}

/*
    /api/admin/cities
*/
pub async fn create_city<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<CatalogCityRequest>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner().into_command()?;
    let city = state.catalog().create(input).await?;
    Ok(created(CatalogCityView::from(&city)))
}

pub async fn update_city<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
    body: web::Json<CatalogCityRequest>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner().into_command()?;
    let city = state.catalog().update(&path.into_inner(), input).await?;
    Ok(ok(CatalogCityView::from(&city)))
}

pub async fn delete_city<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state.catalog().delete(&path.into_inner()).await?;
    Ok(ok_message("City deleted"))
}

/*
    /api/admin/settings
*/
pub async fn get_settings<S: Store>(
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, AppError> {
    Ok(ok(state.admin().settings().await?))
}

pub async fn update_settings<S: Store>(
    state: web::Data<AppState<S>>,
    actor: AuthenticatedUser,
    body: web::Json<UpdateSettingsRequest>,
) -> Result<HttpResponse, AppError> {
    let settings = state
        .admin()
        .update_settings(&actor, body.into_inner())
        .await?;
    Ok(ok(settings))
}
