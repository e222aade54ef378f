use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::{value_to_f64, value_to_string, FieldErrors};
use crate::error::AppError;
use crate::models::location::{Coordinates, Location};
use crate::models::trip::budget::{non_negative, Budget, BudgetSummary, Currency};
use crate::models::trip::city::{clamp_rating, NewActivity, NewCity, MAX_ACTIVITY_TAGS};
use crate::models::trip::itinerary::{
    ItineraryDay, ItineraryItem, MAX_DAYS, MAX_ITEMS_PER_DAY,
};
use crate::models::trip::{
    parse_trip_date, NewTrip, TripStatus, TripUpdate, MAX_TRIP_TAGS,
};
use crate::sanitize::{clean_tags, image_or_empty, is_image_url, slugify, truncate};

const DATE_MESSAGE: &str = "must be a valid date (YYYY-MM-DD or RFC 3339)";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BudgetInput {
    #[validate(range(min = 0.0, message = "Budget amount cannot be negative"))]
    #[serde(default)]
    pub amount: f64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(length(max = 100, message = "City must be at most 100 characters"))]
    #[serde(default)]
    pub city: String,
    #[validate(length(max = 100, message = "Country must be at most 100 characters"))]
    #[serde(default)]
    pub country: String,
    #[validate(nested)]
    pub coordinates: Option<Coordinates>,
}

impl LocationInput {
    fn into_location(self) -> Location {
        Location {
            city: self.city.trim().to_string(),
            country: self.country.trim().to_string(),
            coordinates: self.coordinates,
        }
    }
}

fn decode_budget(errors: &mut FieldErrors, input: BudgetInput) -> Option<Budget> {
    let currency = match input.currency.as_deref() {
        None | Some("") => Currency::default(),
        Some(code) => errors.parse("currency", code)?,
    };
    Some(Budget {
        amount: input.amount,
        currency,
    })
}

fn decode_date(errors: &mut FieldErrors, field: &str, value: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_trip_date(value);
    if parsed.is_none() {
        errors.push(field, format!("{} {}", field, DATE_MESSAGE));
    }
    parsed
}

fn check_cover_photo(errors: &mut FieldErrors, cover_photo: &str) {
    if !cover_photo.trim().is_empty() && !is_image_url(cover_photo) {
        errors.push("coverPhoto", "Cover photo must be an image URL");
    }
}

fn check_tags(errors: &mut FieldErrors, tags: &[String]) {
    if tags.len() > MAX_TRIP_TAGS {
        errors.push(
            "tags",
            format!("A trip can have at most {} tags", MAX_TRIP_TAGS),
        );
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    #[serde(default)]
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub cover_photo: String,
    pub status: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(nested)]
    pub budget: Option<BudgetInput>,
    #[validate(nested)]
    pub location: Option<LocationInput>,
}

impl CreateTripRequest {
    pub fn into_command(self) -> Result<NewTrip, AppError> {
        let mut errors = FieldErrors::validate(&self);
        if self.name.trim().is_empty() && !errors.has("name") {
            errors.push("name", "Name is required");
        }
        let start = decode_date(&mut errors, "startDate", &self.start_date);
        let end = decode_date(&mut errors, "endDate", &self.end_date);
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                errors.push("endDate", "End date must be after start date");
            }
        }
        let status = match self.status.as_deref() {
            None => Some(TripStatus::default()),
            Some(status) => errors.parse("status", status),
        };
        check_cover_photo(&mut errors, &self.cover_photo);
        check_tags(&mut errors, &self.tags);
        let budget = match self.budget {
            Some(budget) => decode_budget(&mut errors, budget),
            None => Some(Budget::default()),
        };
        errors.into_result()?;

        // Every `None` above recorded an error, so these are all present.
        match (start, end, status, budget) {
            (Some(start_date), Some(end_date), Some(status), Some(budget)) => Ok(NewTrip {
                name: self.name.trim().to_string(),
                description: self.description.trim().to_string(),
                start_date,
                end_date,
                cover_photo: self.cover_photo.trim().to_string(),
                status,
                is_public: self.is_public,
                tags: clean_tags(&self.tags, MAX_TRIP_TAGS),
                budget,
                location: self.location.map(LocationInput::into_location).unwrap_or_default(),
            }),
            _ => Err(AppError::BadRequest("Invalid trip payload".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cover_photo: Option<String>,
    pub status: Option<String>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
    #[validate(nested)]
    pub budget: Option<BudgetInput>,
    #[validate(nested)]
    pub location: Option<LocationInput>,
}

impl UpdateTripRequest {
    /// Date ordering against the stored trip is checked when the update
    /// is applied; here only a pair supplied together is compared.
    pub fn into_command(self) -> Result<TripUpdate, AppError> {
        let mut errors = FieldErrors::validate(&self);
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) && !errors.has("name") {
            errors.push("name", "Name cannot be empty");
        }
        let start_date = self
            .start_date
            .as_deref()
            .and_then(|value| decode_date(&mut errors, "startDate", value));
        let end_date = self
            .end_date
            .as_deref()
            .and_then(|value| decode_date(&mut errors, "endDate", value));
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start >= end {
                errors.push("endDate", "End date must be after start date");
            }
        }
        let status = self
            .status
            .as_deref()
            .and_then(|status| errors.parse::<TripStatus>("status", status));
        if let Some(cover_photo) = &self.cover_photo {
            check_cover_photo(&mut errors, cover_photo);
        }
        if let Some(tags) = &self.tags {
            check_tags(&mut errors, tags);
        }
        let budget = self
            .budget
            .and_then(|budget| decode_budget(&mut errors, budget));
        errors.into_result()?;

        Ok(TripUpdate {
            name: self.name.map(|name| name.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
            start_date,
            end_date,
            cover_photo: self.cover_photo.map(|c| c.trim().to_string()),
            status,
            is_public: self.is_public,
            tags: self.tags.map(|tags| clean_tags(&tags, MAX_TRIP_TAGS)),
            budget,
            location: self.location.map(LocationInput::into_location),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCityRequest {
    #[validate(length(min = 1, max = 100, message = "City id is required"))]
    pub id: String,
    #[validate(length(min = 1, max = 100, message = "City name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    pub image: Option<String>,
}

impl AddCityRequest {
    pub fn into_command(self) -> Result<NewCity, AppError> {
        let mut errors = FieldErrors::validate(&self);
        for (field, value) in [("id", &self.id), ("name", &self.name), ("country", &self.country)] {
            if value.trim().is_empty() && !errors.has(field) {
                errors.push(field, format!("{} is required", field));
            }
        }
        errors.into_result()?;

        Ok(NewCity {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            country: self.country.trim().to_string(),
            image: image_or_empty(self.image.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddActivityRequest {
    #[validate(length(min = 1, max = 100, message = "Activity id is required"))]
    pub id: String,
    #[validate(length(min = 1, max = 200, message = "Activity name is required"))]
    pub name: String,
    #[serde(default)]
    pub city: String,
    pub category: String,
    pub cost: String,
    pub duration: String,
    pub rating: Option<f64>,
    pub image: Option<String>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AddActivityRequest {
    pub fn into_command(self) -> Result<NewActivity, AppError> {
        let mut errors = FieldErrors::validate(&self);
        if self.id.trim().is_empty() && !errors.has("id") {
            errors.push("id", "Activity id is required");
        }
        if self.name.trim().is_empty() && !errors.has("name") {
            errors.push("name", "Activity name is required");
        }
        let category = errors.parse("category", &self.category);
        let cost = errors.parse("cost", &self.cost);
        let duration = errors.parse("duration", &self.duration);
        errors.into_result()?;

        match (category, cost, duration) {
            (Some(category), Some(cost), Some(duration)) => Ok(NewActivity {
                id: self.id.trim().to_string(),
                name: self.name.trim().to_string(),
                city: self.city.trim().to_string(),
                category,
                cost,
                duration,
                rating: clamp_rating(self.rating),
                image: image_or_empty(self.image.as_deref()),
                description: self.description.trim().to_string(),
                tags: clean_tags(&self.tags, MAX_ACTIVITY_TAGS),
            }),
            _ => Err(AppError::BadRequest("Invalid activity payload".to_string())),
        }
    }
}

/// An activity picked from search results, saved into the caller's most
/// recent trip under its city.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveActivityRequest {
    #[validate(length(min = 1, max = 100, message = "City name is required"))]
    pub city_name: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    pub city_image: Option<String>,
    #[validate(nested)]
    pub activity: AddActivityRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveActivity {
    pub city: NewCity,
    pub activity: NewActivity,
}

impl SaveActivityRequest {
    pub fn into_command(self) -> Result<SaveActivity, AppError> {
        let mut errors = FieldErrors::validate(&self);
        let city_id = slugify(&format!("{}-{}", self.city_name, self.country));
        if city_id.is_empty() && !errors.has("cityName") {
            errors.push("cityName", "City name is required");
        }
        errors.into_result()?;

        let activity = self.activity.into_command()?;
        Ok(SaveActivity {
            city: NewCity {
                id: city_id,
                name: self.city_name.trim().to_string(),
                country: self.country.trim().to_string(),
                image: image_or_empty(self.city_image.as_deref()),
            },
            activity,
        })
    }
}

/// Itinerary days arrive loosely typed; every scalar is stringified and
/// truncated rather than rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct ItineraryRequest {
    #[serde(default)]
    pub itinerary: Vec<Value>,
}

impl ItineraryRequest {
    pub fn into_command(self) -> Vec<ItineraryDay> {
        self.itinerary
            .iter()
            .filter(|day| day.is_object())
            .take(MAX_DAYS)
            .map(decode_day)
            .collect()
    }
}

fn id_or_generated(value: Option<&Value>) -> String {
    let id = value_to_string(value);
    if id.trim().is_empty() {
        Uuid::new_v4().simple().to_string()
    } else {
        id
    }
}

fn decode_day(day: &Value) -> ItineraryDay {
    let items = day
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .take(MAX_ITEMS_PER_DAY)
                .map(|item| {
                    let activity_id = value_to_string(item.get("activityId"));
                    ItineraryItem::sanitized(
                        &id_or_generated(item.get("id")),
                        Some(activity_id.as_str()).filter(|id| !id.trim().is_empty()),
                        &value_to_string(item.get("time")),
                        &value_to_string(item.get("name")),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    ItineraryDay::sanitized(
        &id_or_generated(day.get("id")),
        &value_to_string(day.get("date")),
        items,
    )
}

/// Loosely typed budget buckets. Missing or invalid numbers become zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetSummaryRequest {
    pub transport: Option<Value>,
    pub stay: Option<Value>,
    pub activities: Option<Value>,
    pub meals: Option<Value>,
    pub total: Option<Value>,
    pub currency: Option<Value>,
}

impl BudgetSummaryRequest {
    /// `fallback_currency` is the trip budget's currency.
    pub fn into_command(self, fallback_currency: Currency) -> BudgetSummary {
        let mut summary = BudgetSummary {
            transport: non_negative(value_to_f64(self.transport.as_ref())),
            stay: non_negative(value_to_f64(self.stay.as_ref())),
            activities: non_negative(value_to_f64(self.activities.as_ref())),
            meals: non_negative(value_to_f64(self.meals.as_ref())),
            total: 0.0,
            currency: String::new(),
        };
        summary.total = match self.total.as_ref().filter(|v| !v.is_null()) {
            Some(total) => non_negative(value_to_f64(Some(total))),
            None => summary.bucket_sum(),
        };
        let currency = truncate(&value_to_string(self.currency.as_ref()), 3).to_uppercase();
        summary.currency = if currency.is_empty() {
            fallback_currency.code().to_string()
        } else {
            currency
        };
        summary
    }
}
