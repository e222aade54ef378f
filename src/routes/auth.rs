use actix_web::{web, HttpResponse};

use crate::commands::auth::{
    ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest, SignupRequest,
};
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::user::UserView;
use crate::routes::{created, ok, ok_message};
use crate::AppState;

const RESET_REQUESTED: &str =
    "If an account exists for that email, a password reset link has been sent";

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup::<S>))
            .route("/login", web::post().to(login::<S>))
            .route("/refresh", web::post().to(refresh::<S>))
            .route("/forgot-password", web::post().to(forgot_password::<S>))
            .route("/reset-password", web::post().to(reset_password::<S>))
            .service(
                web::scope("")
                    .wrap(AuthMiddleware)
                    .route("/logout", web::post().to(logout::<S>))
                    .route("/me", web::get().to(me::<S>)),
            ),
    );
}

/*
    /api/auth/signup
*/
pub async fn signup<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    let session = state.auth().signup(cmd).await?;
    Ok(created(session))
}

/*
    /api/auth/login
*/
pub async fn login<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    let session = state.auth().login(cmd).await?;
    Ok(ok(session))
}

/*
    /api/auth/refresh
    Each refresh token is accepted once and replaced by a new pair.
*/
pub async fn refresh<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let token = body.into_inner().into_token()?;
    let session = state.auth().refresh(&token).await?;
    Ok(ok(session))
}

/*
    /api/auth/forgot-password
*/
pub async fn forgot_password<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let email = body.into_inner().into_email()?;
    state
        .auth()
        .forgot_password(&email, &state.config.client_url)
        .await?;
    Ok(ok_message(RESET_REQUESTED))
}

/*
    /api/auth/reset-password
*/
pub async fn reset_password<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    state.auth().reset_password(cmd).await?;
    Ok(ok_message("Password has been reset. Please log in again"))
}

/*
    /api/auth/logout
*/
pub async fn logout<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let token = body.into_inner().into_token()?;
    state.auth().logout(&user.user_id, &token).await?;
    Ok(ok_message("Logged out"))
}

/*
    /api/auth/me
*/
pub async fn me<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let current = state.auth().current_user(&user.user_id).await?;
    Ok(ok(UserView::from(&current)))
}
