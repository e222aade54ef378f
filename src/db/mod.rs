//! Repository interfaces over the three collections plus the settings
//! record. Services are generic over [`Store`] so the same code runs
//! against MongoDB and the in-process store.
#![allow(async_fn_in_trait)]

pub mod memory;
pub mod mongo;

use bson::oid::ObjectId;

use crate::models::catalog::{CatalogCity, CatalogQuery};
use crate::models::pagination::Page;
use crate::models::settings::Settings;
use crate::models::stats::{PopularDestination, TripStats};
use crate::models::trip::{Trip, TripQuery};
use crate::models::user::{RefreshToken, User, UserQuery};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCounts {
    pub total: u64,
    pub active: u64,
    pub admins: u64,
}

pub trait TripStore {
    async fn insert_trip(&self, trip: &Trip) -> StoreResult<ObjectId>;
    async fn find_trip(&self, id: &ObjectId) -> StoreResult<Option<Trip>>;
    /// Replaces the whole stored document.
    async fn save_trip(&self, trip: &Trip) -> StoreResult<()>;
    async fn delete_trip(&self, id: &ObjectId) -> StoreResult<bool>;
    async fn delete_trips_by_user(&self, user: &ObjectId) -> StoreResult<u64>;
    /// The owner's most recently created trip.
    async fn latest_trip_for_user(&self, user: &ObjectId) -> StoreResult<Option<Trip>>;
    /// Newest first.
    async fn list_trips(&self, query: &TripQuery, page: Page) -> StoreResult<(Vec<Trip>, u64)>;
    async fn all_trips(&self, query: &TripQuery) -> StoreResult<Vec<Trip>>;
    /// Cities of public, non-cancelled trips ranked by how many trips
    /// include them, computed without loading the trips.
    async fn popular_destinations(&self, limit: usize) -> StoreResult<Vec<PopularDestination>>;
    /// Platform-wide trip counts.
    async fn trip_stats(&self) -> StoreResult<TripStats>;
}

pub trait UserStore {
    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId>;
    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Only matches while the reset token is unexpired at `now_ts`.
    async fn find_user_by_reset_token(
        &self,
        token_hash: &str,
        now_ts: i64,
    ) -> StoreResult<Option<User>>;
    /// Writes every field except `refresh_tokens`, which only the token
    /// methods below change.
    async fn save_user(&self, user: &User) -> StoreResult<()>;
    async fn delete_user(&self, id: &ObjectId) -> StoreResult<bool>;
    async fn list_users(&self, query: &UserQuery, page: Page) -> StoreResult<(Vec<User>, u64)>;
    async fn count_users(&self) -> StoreResult<UserCounts>;

    /// Drops expired tokens, appends `token` and caps the list length.
    async fn push_refresh_token(
        &self,
        user: &ObjectId,
        token: RefreshToken,
        now_ts: i64,
    ) -> StoreResult<()>;
    /// Atomically removes `token`; false when it was not in the list.
    async fn take_refresh_token(&self, user: &ObjectId, token: &str) -> StoreResult<bool>;
    async fn clear_refresh_tokens(&self, user: &ObjectId) -> StoreResult<()>;
}

pub trait CatalogStore {
    async fn insert_city(&self, city: &CatalogCity) -> StoreResult<ObjectId>;
    async fn find_city(&self, id: &ObjectId) -> StoreResult<Option<CatalogCity>>;
    async fn save_city(&self, city: &CatalogCity) -> StoreResult<()>;
    async fn delete_city(&self, id: &ObjectId) -> StoreResult<bool>;
    /// Most popular first, then by name.
    async fn list_cities(
        &self,
        query: &CatalogQuery,
        page: Page,
    ) -> StoreResult<(Vec<CatalogCity>, u64)>;
    async fn count_cities(&self) -> StoreResult<u64>;
}

pub trait SettingsStore {
    /// Defaults when nothing has been saved yet.
    async fn load_settings(&self) -> StoreResult<Settings>;
    async fn save_settings(&self, settings: &Settings) -> StoreResult<()>;
}

pub trait Store: TripStore + UserStore + CatalogStore + SettingsStore + Send + Sync + 'static {}

impl<T> Store for T where
    T: TripStore + UserStore + CatalogStore + SettingsStore + Send + Sync + 'static
{
}
