//! In-process store with the same semantics as [`MongoStore`]. Backs the
//! test suite and `STORAGE_BACKEND=memory` local runs.
//!
//! [`MongoStore`]: crate::db::mongo::MongoStore

use std::sync::{Mutex, MutexGuard};

use bson::oid::ObjectId;

use crate::db::{
    CatalogStore, SettingsStore, StoreError, StoreResult, TripStore, UserCounts, UserStore,
};
use crate::models::catalog::{CatalogCity, CatalogQuery};
use crate::models::pagination::Page;
use crate::models::settings::Settings;
use crate::models::stats::{rank_destinations, PopularDestination, TripStats};
use crate::models::trip::{Trip, TripQuery};
use crate::models::user::{prune_sessions, RefreshToken, User, UserQuery};

#[derive(Default)]
struct State {
    // Kept in insertion order.
    users: Vec<User>,
    trips: Vec<Trip>,
    cities: Vec<CatalogCity>,
    settings: Option<Settings>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

fn paginate<T: Clone>(items: Vec<&T>, page: Page) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.skip() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect();
    (items, total)
}

fn user_matches(query: &UserQuery, user: &User) -> bool {
    let search_ok = query
        .search
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .is_none_or(|term| contains_ci(&user.name, term) || contains_ci(&user.email, term));
    search_ok && query.role.is_none_or(|role| user.role == role)
}

fn city_matches(query: &CatalogQuery, city: &CatalogCity) -> bool {
    let search_ok = query
        .search
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .is_none_or(|term| contains_ci(&city.name, term) || contains_ci(&city.country, term));
    let region_ok = query
        .region
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .is_none_or(|region| city.region.eq_ignore_ascii_case(region.trim()));
    search_ok && region_ok
}

impl TripStore for MemoryStore {
    async fn insert_trip(&self, trip: &Trip) -> StoreResult<ObjectId> {
        let id = ObjectId::new();
        let mut stored = trip.clone();
        stored.id = Some(id);
        self.state().trips.push(stored);
        Ok(id)
    }

    async fn find_trip(&self, id: &ObjectId) -> StoreResult<Option<Trip>> {
        Ok(self
            .state()
            .trips
            .iter()
            .find(|t| t.id.as_ref() == Some(id))
            .cloned())
    }

    async fn save_trip(&self, trip: &Trip) -> StoreResult<()> {
        let mut state = self.state();
        let slot = state
            .trips
            .iter_mut()
            .find(|t| t.id.is_some() && t.id == trip.id)
            .ok_or(StoreError::NotFound("Trip"))?;
        *slot = trip.clone();
        Ok(())
    }

    async fn delete_trip(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.trips.len();
        state.trips.retain(|t| t.id.as_ref() != Some(id));
        Ok(state.trips.len() != before)
    }

    async fn delete_trips_by_user(&self, user: &ObjectId) -> StoreResult<u64> {
        let mut state = self.state();
        let before = state.trips.len();
        state.trips.retain(|t| t.user != *user);
        Ok((before - state.trips.len()) as u64)
    }

    async fn latest_trip_for_user(&self, user: &ObjectId) -> StoreResult<Option<Trip>> {
        Ok(self
            .state()
            .trips
            .iter()
            .rev()
            .find(|t| t.user == *user)
            .cloned())
    }

    async fn list_trips(&self, query: &TripQuery, page: Page) -> StoreResult<(Vec<Trip>, u64)> {
        let state = self.state();
        let matching: Vec<&Trip> = state.trips.iter().rev().filter(|t| query.matches(t)).collect();
        Ok(paginate(matching, page))
    }

    async fn all_trips(&self, query: &TripQuery) -> StoreResult<Vec<Trip>> {
        Ok(self
            .state()
            .trips
            .iter()
            .rev()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn popular_destinations(&self, limit: usize) -> StoreResult<Vec<PopularDestination>> {
        Ok(rank_destinations(&self.state().trips, limit))
    }

    async fn trip_stats(&self) -> StoreResult<TripStats> {
        Ok(TripStats::from_trips(&self.state().trips))
    }
}

impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("User"));
        }
        let id = ObjectId::new();
        let mut stored = user.clone();
        stored.id = Some(id);
        state.users.push(stored);
        Ok(id)
    }

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.id.as_ref() == Some(id))
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_reset_token(
        &self,
        token_hash: &str,
        now_ts: i64,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| {
                u.password_reset_token.as_deref() == Some(token_hash)
                    && u.password_reset_expires.is_some_and(|exp| exp > now_ts)
            })
            .cloned())
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut state = self.state();
        if state
            .users
            .iter()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(StoreError::Duplicate("User"));
        }
        let slot = state
            .users
            .iter_mut()
            .find(|u| u.id.is_some() && u.id == user.id)
            .ok_or(StoreError::NotFound("User"))?;
        let sessions = std::mem::take(&mut slot.refresh_tokens);
        *slot = user.clone();
        slot.refresh_tokens = sessions;
        Ok(())
    }

    async fn delete_user(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.users.len();
        state.users.retain(|u| u.id.as_ref() != Some(id));
        Ok(state.users.len() != before)
    }

    async fn list_users(&self, query: &UserQuery, page: Page) -> StoreResult<(Vec<User>, u64)> {
        let state = self.state();
        let matching: Vec<&User> = state
            .users
            .iter()
            .rev()
            .filter(|u| user_matches(query, u))
            .collect();
        Ok(paginate(matching, page))
    }

    async fn count_users(&self) -> StoreResult<UserCounts> {
        let state = self.state();
        Ok(UserCounts {
            total: state.users.len() as u64,
            active: state.users.iter().filter(|u| u.is_active).count() as u64,
            admins: state.users.iter().filter(|u| u.role.is_admin()).count() as u64,
        })
    }

    async fn push_refresh_token(
        &self,
        user: &ObjectId,
        token: RefreshToken,
        now_ts: i64,
    ) -> StoreResult<()> {
        let mut state = self.state();
        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id.as_ref() == Some(user))
            .ok_or(StoreError::NotFound("User"))?;
        prune_sessions(&mut stored.refresh_tokens, now_ts);
        stored.refresh_tokens.push(token);
        Ok(())
    }

    async fn take_refresh_token(&self, user: &ObjectId, token: &str) -> StoreResult<bool> {
        let mut state = self.state();
        let Some(stored) = state.users.iter_mut().find(|u| u.id.as_ref() == Some(user)) else {
            return Ok(false);
        };
        let before = stored.refresh_tokens.len();
        stored.refresh_tokens.retain(|t| t.token != token);
        Ok(stored.refresh_tokens.len() != before)
    }

    async fn clear_refresh_tokens(&self, user: &ObjectId) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(stored) = state.users.iter_mut().find(|u| u.id.as_ref() == Some(user)) {
            stored.refresh_tokens.clear();
        }
        Ok(())
    }
}

impl CatalogStore for MemoryStore {
    async fn insert_city(&self, city: &CatalogCity) -> StoreResult<ObjectId> {
        let mut state = self.state();
        if state
            .cities
            .iter()
            .any(|c| c.same_place(&city.name, &city.country))
        {
            return Err(StoreError::Duplicate("City"));
        }
        let id = ObjectId::new();
        let mut stored = city.clone();
        stored.id = Some(id);
        state.cities.push(stored);
        Ok(id)
    }

    async fn find_city(&self, id: &ObjectId) -> StoreResult<Option<CatalogCity>> {
        Ok(self
            .state()
            .cities
            .iter()
            .find(|c| c.id.as_ref() == Some(id))
            .cloned())
    }

    async fn save_city(&self, city: &CatalogCity) -> StoreResult<()> {
        let mut state = self.state();
        if state
            .cities
            .iter()
            .any(|c| c.id != city.id && c.same_place(&city.name, &city.country))
        {
            return Err(StoreError::Duplicate("City"));
        }
        let slot = state
            .cities
            .iter_mut()
            .find(|c| c.id.is_some() && c.id == city.id)
            .ok_or(StoreError::NotFound("City"))?;
        *slot = city.clone();
        Ok(())
    }

    async fn delete_city(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.cities.len();
        state.cities.retain(|c| c.id.as_ref() != Some(id));
        Ok(state.cities.len() != before)
    }

    async fn list_cities(
        &self,
        query: &CatalogQuery,
        page: Page,
    ) -> StoreResult<(Vec<CatalogCity>, u64)> {
        let state = self.state();
        let mut matching: Vec<&CatalogCity> = state
            .cities
            .iter()
            .filter(|c| city_matches(query, c))
            .collect();
        matching.sort_by(|a, b| b.popularity.cmp(&a.popularity).then(a.name.cmp(&b.name)));
        Ok(paginate(matching, page))
    }

    async fn count_cities(&self) -> StoreResult<u64> {
        Ok(self.state().cities.len() as u64)
    }
}

impl SettingsStore for MemoryStore {
    async fn load_settings(&self) -> StoreResult<Settings> {
        Ok(self.state().settings.clone().unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.state().settings = Some(settings.clone());
        Ok(())
    }
}
