use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::commands::query::TripListParams;
use crate::commands::trip::{
    AddActivityRequest, AddCityRequest, BudgetSummaryRequest, CreateTripRequest,
    ItineraryRequest, SaveActivityRequest, UpdateTripRequest,
};
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::pagination::{Page, Paginated};
use crate::models::trip::{Trip, TripQuery, TripView};
use crate::routes::{created, ok, ok_message, ok_with_message};
use crate::AppState;

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trips")
            .route("/public", web::get().to(list_public_trips::<S>))
            .route("/public/{id}", web::get().to(get_public_trip::<S>))
            .service(
                web::scope("")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(list_trips::<S>))
                    .route("", web::post().to(create_trip::<S>))
                    .route("/save-activity", web::post().to(save_activity::<S>))
                    .route("/{id}", web::get().to(get_trip::<S>))
                    .route("/{id}", web::put().to(update_trip::<S>))
                    .route("/{id}", web::delete().to(delete_trip::<S>))
                    .route("/{id}/cities", web::post().to(add_city::<S>))
                    .route("/{id}/cities/{city_id}", web::delete().to(remove_city::<S>))
                    .route(
                        "/{id}/cities/{city_id}/activities",
                        web::post().to(add_activity::<S>),
                    )
                    .route(
                        "/{id}/cities/{city_id}/activities/{activity_id}",
                        web::delete().to(remove_activity::<S>),
                    )
                    .route("/{id}/itinerary", web::put().to(replace_itinerary::<S>))
                    .route(
                        "/{id}/budget-summary",
                        web::put().to(replace_budget_summary::<S>),
                    ),
            ),
    );
}

fn view(trip: Trip) -> TripView {
    TripView::new(trip, Utc::now())
}

fn page_of(trips: Vec<Trip>, page: Page, total: u64) -> Paginated<TripView> {
    let now = Utc::now();
    let items = trips.into_iter().map(|t| TripView::new(t, now)).collect();
    Paginated::new(items, page, total)
}

/*
    /api/trips/public?page&limit
*/
pub async fn list_public_trips<S: Store>(
    state: web::Data<AppState<S>>,
    params: web::Query<TripListParams>,
) -> Result<HttpResponse, AppError> {
    let base = TripQuery {
        public_only: true,
        ..TripQuery::default()
    };
    let (query, page) = params.into_inner().decode(base)?;
    let (trips, total) = state.trips().list(&query, page).await?;
    Ok(ok(page_of(trips, page, total)))
}

/*
    /api/trips/public/{id}
*/
pub async fn get_public_trip<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let trip = state.trips().get_public(&path.into_inner()).await?;
    Ok(ok(view(trip)))
}

/*
    /api/trips?page&limit&status&search
*/
pub async fn list_trips<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    params: web::Query<TripListParams>,
) -> Result<HttpResponse, AppError> {
    let (query, page) = params
        .into_inner()
        .decode(TripQuery::owned_by(user.user_id))?;
    let (trips, total) = state.trips().list(&query, page).await?;
    Ok(ok(page_of(trips, page, total)))
}

pub async fn create_trip<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    body: web::Json<CreateTripRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    let trip = state.trips().create(&user.user_id, cmd).await?;
    Ok(created(view(trip)))
}

/*
    /api/trips/save-activity
    Files the activity under the caller's latest trip.
*/
pub async fn save_activity<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    body: web::Json<SaveActivityRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    let trip = state.trips().save_activity(&user.user_id, cmd).await?;
    Ok(ok_with_message("Activity saved to trip", view(trip)))
}

/*
    /api/trips/{id}
*/
pub async fn get_trip<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let trip = state.trips().get(&path.into_inner(), &user.user_id).await?;
    Ok(ok(view(trip)))
}

pub async fn update_trip<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<UpdateTripRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    let trip = state
        .trips()
        .update(&path.into_inner(), &user.user_id, cmd)
        .await?;
    Ok(ok(view(trip)))
}

pub async fn delete_trip<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state
        .trips()
        .delete(&path.into_inner(), &user.user_id)
        .await?;
    Ok(ok_message("Trip deleted"))
}

/*
    /api/trips/{id}/cities
*/
pub async fn add_city<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<AddCityRequest>,
) -> Result<HttpResponse, AppError> {
    let cmd = body.into_inner().into_command()?;
    let trip = state
        .trips()
        .add_city(&path.into_inner(), &user.user_id, cmd)
        .await?;
    Ok(created(view(trip)))
}

/*
    /api/trips/{id}/cities/{city_id}
*/
pub async fn remove_city<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (trip_id, city_id) = path.into_inner();
    let trip = state
        .trips()
        .remove_city(&trip_id, &user.user_id, &city_id)
        .await?;
    Ok(ok(view(trip)))
}

/*
    /api/trips/{id}/cities/{city_id}/activities
*/
pub async fn add_activity<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
    body: web::Json<AddActivityRequest>,
) -> Result<HttpResponse, AppError> {
    let (trip_id, city_id) = path.into_inner();
    let cmd = body.into_inner().into_command()?;
    let trip = state
        .trips()
        .add_activity(&trip_id, &user.user_id, &city_id, cmd)
        .await?;
    Ok(created(view(trip)))
}

/*
    /api/trips/{id}/cities/{city_id}/activities/{activity_id}
*/
pub async fn remove_activity<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, AppError> {
    let (trip_id, city_id, activity_id) = path.into_inner();
    let trip = state
        .trips()
        .remove_activity(&trip_id, &user.user_id, &city_id, &activity_id)
        .await?;
    Ok(ok(view(trip)))
}

/*
    /api/trips/{id}/itinerary
*/
pub async fn replace_itinerary<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<ItineraryRequest>,
) -> Result<HttpResponse, AppError> {
    let days = body.into_inner().into_command();
    let trip = state
        .trips()
        .replace_itinerary(&path.into_inner(), &user.user_id, days)
        .await?;
    Ok(ok(view(trip)))
}

/*
    /api/trips/{id}/budget-summary
*/
pub async fn replace_budget_summary<S: Store>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<BudgetSummaryRequest>,
) -> Result<HttpResponse, AppError> {
    let trip = state
        .trips()
        .replace_budget_summary(&path.into_inner(), &user.user_id, body.into_inner())
        .await?;
    Ok(ok(view(trip)))
}
