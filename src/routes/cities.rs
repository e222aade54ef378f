use actix_web::{web, HttpResponse};

use crate::commands::query::CatalogListParams;
use crate::db::Store;
use crate::error::AppError;
use crate::models::catalog::CatalogCityView;
use crate::models::pagination::Paginated;
use crate::routes::ok;
use crate::AppState;

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cities")
            .route("", web::get().to(list_cities::<S>))
            .route("/{id}", web::get().to(get_city::<S>)),
    );
}

/*
    /api/cities?page&limit&search&region
*/
pub async fn list_cities<S: Store>(
    state: web::Data<AppState<S>>,
    params: web::Query<CatalogListParams>,
) -> Result<HttpResponse, AppError> {
    let (query, page) = params.into_inner().decode();
    let (cities, total) = state.catalog().list(&query, page).await?;
    let items = cities.iter().map(CatalogCityView::from).collect();
    Ok(ok(Paginated::new(items, page, total)))
}

/*
    /api/cities/{id}
*/
pub async fn get_city<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let city = state.catalog().get(&path.into_inner()).await?;
    Ok(ok(CatalogCityView::from(&city)))
}
