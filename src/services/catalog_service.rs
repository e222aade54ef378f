use chrono::Utc;

use super::parse_id;
use crate::commands::admin::CatalogCityInput;
use crate::db::Store;
use crate::error::AppError;
use crate::models::catalog::{CatalogCity, CatalogQuery};
use crate::models::pagination::Page;

const CITY: &str = "City";

pub struct CatalogService<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> CatalogService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        query: &CatalogQuery,
        page: Page,
    ) -> Result<(Vec<CatalogCity>, u64), AppError> {
        Ok(self.store.list_cities(query, page).await?)
    }

    pub async fn get(&self, id: &str) -> Result<CatalogCity, AppError> {
        let id = parse_id(id, CITY)?;
        self.store
            .find_city(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("City not found".to_string()))
    }

    pub async fn create(&self, input: CatalogCityInput) -> Result<CatalogCity, AppError> {
        let now = Utc::now();
        let mut city = CatalogCity {
            id: None,
            name: input.name,
            country: input.country,
            region: input.region,
            cost_index: input.cost_index,
            popularity: input.popularity,
            image: input.image,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        city.id = Some(self.store.insert_city(&city).await?);
        log::info!("Catalog city {}, {} created", city.name, city.country);
        Ok(city)
    }

    pub async fn update(&self, id: &str, input: CatalogCityInput) -> Result<CatalogCity, AppError> {
        let mut city = self.get(id).await?;
        city.name = input.name;
        city.country = input.country;
        city.region = input.region;
        city.cost_index = input.cost_index;
        city.popularity = input.popularity;
        city.image = input.image;
        city.description = input.description;
        city.updated_at = Utc::now();
        self.store.save_city(&city).await?;
        Ok(city)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id, CITY)?;
        if !self.store.delete_city(&id).await? {
            return Err(AppError::NotFound("City not found".to_string()));
        }
        Ok(())
    }
}
