//! The trip aggregate. Cities, their activities, the itinerary and the
//! budget summary are embedded values that only change through the
//! methods on [`Trip`], and the whole document is persisted in one write.

pub mod budget;
pub mod city;
pub mod itinerary;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::Location;
use budget::{Budget, BudgetSummary};
use city::{City, NewActivity, NewCity, UnknownVariant};
use itinerary::ItineraryDay;

pub const MAX_TRIP_TAGS: usize = 20;
pub const PLACEHOLDER_TRIP_NAME: &str = "My Trip";
pub const PLACEHOLDER_TRIP_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripError {
    #[error("City already exists in this trip")]
    CityExists,

    #[error("City not found in this trip")]
    CityNotFound,

    #[error("Activity already exists in this city")]
    ActivityExists,

    #[error("Activity not found in this city")]
    ActivityNotFound,

    #[error("End date must be after start date")]
    InvalidDates,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    #[default]
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub const ALLOWED: &'static [&'static str] = &["planning", "active", "completed", "cancelled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planning => "planning",
            TripStatus::Active => "active",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "planning" => Ok(TripStatus::Planning),
            "active" => Ok(TripStatus::Active),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" => Ok(TripStatus::Cancelled),
            _ => Err(UnknownVariant {
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Where a trip sits relative to the current time. Computed, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStatus {
    Upcoming,
    Ongoing,
    Past,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub cover_photo: String,
    #[serde(default)]
    pub status: TripStatus,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub selected_cities: Vec<City>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub budget_summary: BudgetSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub cover_photo: String,
    pub status: TripStatus,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub budget: Budget,
    pub location: Location,
}

/// Validated partial update of the top-level trip fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cover_photo: Option<String>,
    pub status: Option<TripStatus>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub budget: Option<Budget>,
    pub location: Option<Location>,
}

impl Trip {
    pub fn create(owner: ObjectId, input: NewTrip, now: DateTime<Utc>) -> Result<Self, TripError> {
        let trip = Self {
            id: None,
            user: owner,
            name: input.name,
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            cover_photo: input.cover_photo,
            status: input.status,
            is_public: input.is_public,
            tags: input.tags,
            budget: input.budget,
            location: input.location,
            selected_cities: Vec::new(),
            itinerary: Vec::new(),
            budget_summary: BudgetSummary {
                currency: input.budget.currency.code().to_string(),
                ..BudgetSummary::default()
            },
            created_at: now,
            updated_at: now,
        };
        trip.ensure_valid_dates()?;
        Ok(trip)
    }

    /// Stand-in trip used when an activity is saved before any trip exists.
    pub fn placeholder(owner: ObjectId, now: DateTime<Utc>) -> Self {
        let start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        Self {
            id: None,
            user: owner,
            name: PLACEHOLDER_TRIP_NAME.to_string(),
            description: String::new(),
            start_date: start,
            end_date: start + Duration::days(PLACEHOLDER_TRIP_DAYS),
            cover_photo: String::new(),
            status: TripStatus::Planning,
            is_public: false,
            tags: Vec::new(),
            budget: Budget::default(),
            location: Location::default(),
            selected_cities: Vec::new(),
            itinerary: Vec::new(),
            budget_summary: BudgetSummary::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_edit(&self, user_id: &ObjectId) -> bool {
        self.user == *user_id
    }

    pub fn can_view(&self, user_id: Option<&ObjectId>) -> bool {
        self.is_public || user_id.is_some_and(|id| self.can_edit(id))
    }

    pub fn ensure_valid_dates(&self) -> Result<(), TripError> {
        if self.start_date < self.end_date {
            Ok(())
        } else {
            Err(TripError::InvalidDates)
        }
    }

    /// Whole days covered by the trip, rounded up.
    pub fn duration_days(&self) -> i64 {
        let seconds = (self.end_date - self.start_date).num_seconds();
        if seconds <= 0 {
            0
        } else {
            (seconds + 86_399) / 86_400
        }
    }

    pub fn date_status(&self, now: DateTime<Utc>) -> DateStatus {
        if now < self.start_date {
            DateStatus::Upcoming
        } else if now > self.end_date {
            DateStatus::Past
        } else {
            DateStatus::Ongoing
        }
    }

    /// Applies every field of `update` or none of them.
    pub fn apply_update(&mut self, update: TripUpdate, now: DateTime<Utc>) -> Result<(), TripError> {
        let start = update.start_date.unwrap_or(self.start_date);
        let end = update.end_date.unwrap_or(self.end_date);
        if start >= end {
            return Err(TripError::InvalidDates);
        }

        self.start_date = start;
        self.end_date = end;
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(cover_photo) = update.cover_photo {
            self.cover_photo = cover_photo;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(is_public) = update.is_public {
            self.is_public = is_public;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(budget) = update.budget {
            self.budget = budget;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn city(&self, city_id: &str) -> Option<&City> {
        self.selected_cities.iter().find(|c| c.id == city_id)
    }

    pub fn has_city(&self, city_id: &str) -> bool {
        self.city(city_id).is_some()
    }

    pub fn add_city(&mut self, input: NewCity, now: DateTime<Utc>) -> Result<&City, TripError> {
        if self.has_city(&input.id) {
            return Err(TripError::CityExists);
        }
        self.selected_cities.push(City {
            id: input.id,
            name: input.name,
            country: input.country,
            image: input.image,
            added_at: now,
            activities: Vec::new(),
        });
        self.updated_at = now;
        Ok(&self.selected_cities[self.selected_cities.len() - 1])
    }

    /// Returns whether a city was removed. Absence is not an error.
    pub fn remove_city(&mut self, city_id: &str, now: DateTime<Utc>) -> bool {
        let before = self.selected_cities.len();
        self.selected_cities.retain(|c| c.id != city_id);
        let removed = self.selected_cities.len() != before;
        if removed {
            self.updated_at = now;
        }
        removed
    }

    pub fn add_activity(
        &mut self,
        city_id: &str,
        input: NewActivity,
        now: DateTime<Utc>,
    ) -> Result<(), TripError> {
        let city = self
            .selected_cities
            .iter_mut()
            .find(|c| c.id == city_id)
            .ok_or(TripError::CityNotFound)?;
        if city.has_activity(&input.id) {
            return Err(TripError::ActivityExists);
        }
        let activity = input.into_activity(&city.name, now);
        city.activities.push(activity);

        self.dedupe_cities();
        self.updated_at = now;
        Ok(())
    }

    /// Unlike [`Trip::remove_city`], a missing activity is reported.
    pub fn remove_activity(
        &mut self,
        city_id: &str,
        activity_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TripError> {
        let city = self
            .selected_cities
            .iter_mut()
            .find(|c| c.id == city_id)
            .ok_or(TripError::CityNotFound)?;
        let before = city.activities.len();
        city.activities.retain(|a| a.id != activity_id);
        if city.activities.len() == before {
            return Err(TripError::ActivityNotFound);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Collapses repeated city ids and, inside each city, repeated activity
    /// ids. The first occurrence wins. Heals documents written before the
    /// uniqueness checks existed.
    pub fn dedupe_cities(&mut self) {
        let mut seen = HashSet::new();
        self.selected_cities.retain(|c| seen.insert(c.id.clone()));
        for city in &mut self.selected_cities {
            city.dedupe_activities();
        }
    }

    pub fn replace_itinerary(&mut self, days: Vec<ItineraryDay>, now: DateTime<Utc>) {
        self.itinerary = days;
        self.updated_at = now;
    }

    pub fn replace_budget_summary(&mut self, summary: BudgetSummary, now: DateTime<Utc>) {
        self.budget_summary = summary;
        self.updated_at = now;
    }

    pub fn activity_count(&self) -> usize {
        self.selected_cities.iter().map(|c| c.activities.len()).sum()
    }
}

/// Filters for trip listings.
#[derive(Debug, Clone, Default)]
pub struct TripQuery {
    pub owner: Option<ObjectId>,
    pub status: Option<TripStatus>,
    pub public_only: bool,
    pub search: Option<String>,
}

impl TripQuery {
    pub fn owned_by(owner: ObjectId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn matches(&self, trip: &Trip) -> bool {
        self.owner.is_none_or(|owner| trip.user == owner)
            && self.status.is_none_or(|status| trip.status == status)
            && (!self.public_only || trip.is_public)
            && self.search.as_deref().is_none_or(|term| {
                trip.name.to_lowercase().contains(&term.trim().to_lowercase())
            })
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_trip_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Response shape for a trip, with hex ids and the derived fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripView {
    pub id: String,
    pub user: String,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub cover_photo: String,
    pub status: TripStatus,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub budget: Budget,
    pub location: Location,
    pub selected_cities: Vec<City>,
    pub itinerary: Vec<ItineraryDay>,
    pub budget_summary: BudgetSummary,
    pub duration: i64,
    pub date_status: DateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripView {
    pub fn new(trip: Trip, now: DateTime<Utc>) -> Self {
        let duration = trip.duration_days();
        let date_status = trip.date_status(now);
        Self {
            id: trip.id.map(|id| id.to_hex()).unwrap_or_default(),
            user: trip.user.to_hex(),
            name: trip.name,
            description: trip.description,
            start_date: trip.start_date,
            end_date: trip.end_date,
            cover_photo: trip.cover_photo,
            status: trip.status,
            is_public: trip.is_public,
            tags: trip.tags,
            budget: trip.budget,
            location: trip.location,
            selected_cities: trip.selected_cities,
            itinerary: trip.itinerary,
            budget_summary: trip.budget_summary,
            duration,
            date_status,
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        }
    }
}
