use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::commands::profile::{
    ChangePasswordRequest, DeleteAccountRequest, SavedDestinationRequest, UpdateProfileRequest,
};
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::user::UserView;
use crate::routes::{created, ok, ok_message, ok_with_message};
use crate::AppState;

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .wrap(AuthMiddleware)
            .route("", web::get().to(get_profile::<S>))
            .route("", web::put().to(update_profile::<S>))
            .route("", web::delete().to(delete_account::<S>))
            .route("/password", web::put().to(change_password::<S>))
            .route("/destinations", web::get().to(list_destinations::<S>))
            .route("/destinations", web::post().to(add_destination::<S>))
            .route(
                "/destinations/{id}",
                web::delete().to(remove_destination::<S>),
            ),
    );
}

/*
    /api/profile
*/
pub async fn get_profile<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let profile = state.profile().get(&user.user_id).await?;
    Ok(ok(UserView::from(&profile)))
}

pub async fn update_profile<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    let profile = state.profile().update(&user.user_id, cmd).await?;
    Ok(ok(UserView::from(&profile)))
}

/// Needs `{ "password": ... }` as confirmation; removes the user's trips too.
pub async fn delete_account<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    body: web::Json<DeleteAccountRequest>,
) -> Result<HttpResponse, AppError> {
    let password = body.into_inner().into_password()?;
    state
        .profile()
        .delete_account(&user.user_id, &password)
        .await?;
    Ok(ok_message("Account deleted"))
}

/*
    /api/profile/password
    Every existing session is revoked; the response carries a fresh pair.
*/
pub async fn change_password<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    let session = state.profile().change_password(&user.user_id, cmd).await?;
    Ok(ok_with_message("Password updated", session))
}

/*
    /api/profile/destinations
*/
pub async fn list_destinations<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let destinations = state.profile().destinations(&user.user_id).await?;
    Ok(ok(destinations))
}

pub async fn add_destination<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    body: web::Json<SavedDestinationRequest>,
) -> Result<HttpResponse, AppError> {
    let destination = body.into_inner().into_destination(Utc::now())?;
    let destinations = state
        .profile()
        .add_destination(&user.user_id, destination)
        .await?;
    Ok(created(destinations))
}

pub async fn remove_destination<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let destinations = state
        .profile()
        .remove_destination(&user.user_id, &path.into_inner())
        .await?;
    Ok(ok(destinations))
}
