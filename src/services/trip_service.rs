use bson::oid::ObjectId;
use chrono::Utc;

use super::parse_id;
use crate::commands::trip::{BudgetSummaryRequest, SaveActivity};
use crate::db::Store;
use crate::error::AppError;
use crate::models::pagination::Page;
use crate::models::trip::city::{NewActivity, NewCity};
use crate::models::trip::itinerary::ItineraryDay;
use crate::models::trip::{NewTrip, Trip, TripQuery, TripUpdate};

const TRIP: &str = "Trip";

/// Trip use cases. Every mutation loads the trip, checks ownership,
/// applies the change to the aggregate and saves the whole document.
pub struct TripService<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> TripService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    async fn load(&self, trip_id: &str) -> Result<Trip, AppError> {
        let id = parse_id(trip_id, TRIP)?;
        self.store
            .find_trip(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))
    }

    /// Loads a trip the caller may modify.
    async fn load_owned(&self, trip_id: &str, user_id: &ObjectId) -> Result<Trip, AppError> {
        let trip = self.load(trip_id).await?;
        if !trip.can_edit(user_id) {
            log::warn!("User {} attempted to modify trip {}", user_id, trip_id);
            return Err(AppError::Forbidden(
                "You do not have permission to modify this trip".to_string(),
            ));
        }
        Ok(trip)
    }

    /// Date ordering is re-checked on every write, whatever path produced
    /// the change.
    async fn persist(&self, trip: Trip) -> Result<Trip, AppError> {
        trip.ensure_valid_dates()?;
        self.store.save_trip(&trip).await?;
        Ok(trip)
    }

    pub async fn create(&self, owner: &ObjectId, input: NewTrip) -> Result<Trip, AppError> {
        let mut trip = Trip::create(*owner, input, Utc::now())?;
        trip.id = Some(self.store.insert_trip(&trip).await?);
        log::info!("Trip {:?} created by {}", trip.id, owner);
        Ok(trip)
    }

    pub async fn get(&self, trip_id: &str, viewer: &ObjectId) -> Result<Trip, AppError> {
        let trip = self.load(trip_id).await?;
        if !trip.can_view(Some(viewer)) {
            return Err(AppError::Forbidden(
                "You do not have permission to view this trip".to_string(),
            ));
        }
        Ok(trip)
    }

    /// Anonymous read. Private trips are reported as missing.
    pub async fn get_public(&self, trip_id: &str) -> Result<Trip, AppError> {
        match self.load(trip_id).await? {
            trip if trip.can_view(None) => Ok(trip),
            _ => Err(AppError::NotFound("Trip not found".to_string())),
        }
    }

    pub async fn list(&self, query: &TripQuery, page: Page) -> Result<(Vec<Trip>, u64), AppError> {
        Ok(self.store.list_trips(query, page).await?)
    }

    pub async fn update(
        &self,
        trip_id: &str,
        user_id: &ObjectId,
        update: TripUpdate,
    ) -> Result<Trip, AppError> {
        let mut trip = self.load_owned(trip_id, user_id).await?;
        trip.apply_update(update, Utc::now())?;
        self.persist(trip).await
    }

    pub async fn delete(&self, trip_id: &str, user_id: &ObjectId) -> Result<(), AppError> {
        let trip = self.load_owned(trip_id, user_id).await?;
        self.store.delete_trip(&trip.id.unwrap_or_default()).await?;
        log::info!("Trip {} deleted by {}", trip_id, user_id);
        Ok(())
    }

    pub async fn add_city(
        &self,
        trip_id: &str,
        user_id: &ObjectId,
        city: NewCity,
    ) -> Result<Trip, AppError> {
        let mut trip = self.load_owned(trip_id, user_id).await?;
        trip.add_city(city, Utc::now())?;
        self.persist(trip).await
    }

    /// Succeeds whether or not the city was present.
    pub async fn remove_city(
        &self,
        trip_id: &str,
        user_id: &ObjectId,
        city_id: &str,
    ) -> Result<Trip, AppError> {
        let mut trip = self.load_owned(trip_id, user_id).await?;
        if !trip.remove_city(city_id, Utc::now()) {
            return Ok(trip);
        }
        self.persist(trip).await
    }

    pub async fn add_activity(
        &self,
        trip_id: &str,
        user_id: &ObjectId,
        city_id: &str,
        activity: NewActivity,
    ) -> Result<Trip, AppError> {
        let mut trip = self.load_owned(trip_id, user_id).await?;
        trip.add_activity(city_id, activity, Utc::now())?;
        self.persist(trip).await
    }

    pub async fn remove_activity(
        &self,
        trip_id: &str,
        user_id: &ObjectId,
        city_id: &str,
        activity_id: &str,
    ) -> Result<Trip, AppError> {
        let mut trip = self.load_owned(trip_id, user_id).await?;
        trip.remove_activity(city_id, activity_id, Utc::now())?;
        self.persist(trip).await
    }

    pub async fn replace_itinerary(
        &self,
        trip_id: &str,
        user_id: &ObjectId,
        days: Vec<ItineraryDay>,
    ) -> Result<Trip, AppError> {
        let mut trip = self.load_owned(trip_id, user_id).await?;
        trip.replace_itinerary(days, Utc::now());
        self.persist(trip).await
    }

    /// The summary currency falls back to the trip budget's currency, so
    /// decoding happens once the trip is loaded.
    pub async fn replace_budget_summary(
        &self,
        trip_id: &str,
        user_id: &ObjectId,
        request: BudgetSummaryRequest,
    ) -> Result<Trip, AppError> {
        let mut trip = self.load_owned(trip_id, user_id).await?;
        let summary = request.into_command(trip.budget.currency);
        trip.replace_budget_summary(summary, Utc::now());
        self.persist(trip).await
    }

    /// Files an activity under its city in the caller's most recently
    /// created trip, creating a placeholder trip and the city as needed.
    pub async fn save_activity(
        &self,
        user_id: &ObjectId,
        cmd: SaveActivity,
    ) -> Result<Trip, AppError> {
        let now = Utc::now();
        let mut trip = match self.store.latest_trip_for_user(user_id).await? {
            Some(trip) => trip,
            None => {
                let mut trip = Trip::placeholder(*user_id, now);
                trip.id = Some(self.store.insert_trip(&trip).await?);
                log::info!("Created placeholder trip for {}", user_id);
                trip
            }
        };

        if !trip.has_city(&cmd.city.id) {
            trip.add_city(cmd.city.clone(), now)?;
        }
        trip.add_activity(&cmd.city.id, cmd.activity, now)?;
        self.persist(trip).await
    }
}
