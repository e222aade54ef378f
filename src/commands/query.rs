//! Query-string shapes for the listing endpoints.

use serde::Deserialize;

use super::FieldErrors;
use crate::error::AppError;
use crate::models::catalog::CatalogQuery;
use crate::models::pagination::Page;
use crate::models::trip::{TripQuery, TripStatus};
use crate::models::user::{UserQuery, UserRole};

pub const DEFAULT_POPULAR_LIMIT: usize = 10;
pub const MAX_POPULAR_LIMIT: usize = 50;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageParams {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl TripListParams {
    /// `query` carries any owner or visibility restriction; this adds the
    /// caller's filters.
    pub fn decode(self, mut query: TripQuery) -> Result<(TripQuery, Page), AppError> {
        let mut errors = FieldErrors::default();
        query.status = non_blank(self.status)
            .and_then(|status| errors.parse::<TripStatus>("status", &status));
        errors.into_result()?;
        query.search = non_blank(self.search);
        Ok((query, Page::new(self.page, self.limit)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub role: Option<String>,
}

impl UserListParams {
    pub fn decode(self) -> Result<(UserQuery, Page), AppError> {
        let mut errors = FieldErrors::default();
        let role = non_blank(self.role).and_then(|role| errors.parse::<UserRole>("role", &role));
        errors.into_result()?;
        Ok((
            UserQuery {
                search: non_blank(self.search),
                role,
            },
            Page::new(self.page, self.limit),
        ))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub region: Option<String>,
}

impl CatalogListParams {
    pub fn decode(self) -> (CatalogQuery, Page) {
        (
            CatalogQuery {
                search: non_blank(self.search),
                region: non_blank(self.region),
            },
            Page::new(self.page, self.limit),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PopularParams {
    pub limit: Option<usize>,
}

impl PopularParams {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_POPULAR_LIMIT)
            .clamp(1, MAX_POPULAR_LIMIT)
    }
}
