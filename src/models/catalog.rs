use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference entry in the destination catalog. Unrelated to the cities
/// embedded inside trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub region: String,
    pub cost_index: u8,
    pub popularity: u8,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogCity {
    pub fn same_place(&self, name: &str, country: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) && self.country.eq_ignore_ascii_case(country)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCityView {
    pub id: String,
    pub name: String,
    pub country: String,
    pub region: String,
    pub cost_index: u8,
    pub popularity: u8,
    pub image: String,
    pub description: String,
}

impl From<&CatalogCity> for CatalogCityView {
    fn from(city: &CatalogCity) -> Self {
        Self {
            id: city.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: city.name.clone(),
            country: city.country.clone(),
            region: city.region.clone(),
            cost_index: city.cost_index,
            popularity: city.popularity,
            image: city.image.clone(),
            description: city.description.clone(),
        }
    }
}

/// Filters for browsing the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub region: Option<String>,
}
