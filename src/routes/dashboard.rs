use actix_web::{web, HttpResponse};

use crate::commands::query::PopularParams;
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::routes::ok;
use crate::AppState;

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .wrap(AuthMiddleware)
            .route("", web::get().to(get_dashboard::<S>))
            .route("/budget", web::get().to(get_budget_overview::<S>))
            .route(
                "/popular-destinations",
                web::get().to(get_popular_destinations::<S>),
            ),
    );
}

/*
    /api/dashboard
*/
pub async fn get_dashboard<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    Ok(ok(state.stats().dashboard(&user.user_id).await?))
}

/*
    /api/dashboard/budget
*/
pub async fn get_budget_overview<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    Ok(ok(state.stats().budget_overview(&user.user_id).await?))
}

/*
    /api/dashboard/popular-destinations?limit
    Ranked over every public trip, not just the caller's.
*/
pub async fn get_popular_destinations<S: Store>(
    state: web::Data<AppState<S>>,
    params: web::Query<PopularParams>,
) -> Result<HttpResponse, AppError> {
    let destinations = state
        .stats()
        .popular_destinations(params.limit())
        .await?;
    Ok(ok(destinations))
}
