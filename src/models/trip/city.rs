use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_ACTIVITY_TAGS: usize = 10;
pub const DEFAULT_RATING: f64 = 4.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityCategory {
    Sightseeing,
    Food,
    Adventure,
    Culture,
    Nightlife,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationBucket {
    #[serde(rename = "1–3 hrs", alias = "1-3 hrs")]
    OneToThreeHours,
    #[serde(rename = "Half-day")]
    HalfDay,
    #[serde(rename = "Full-day")]
    FullDay,
}

/// Raised when a string is outside one of the fixed vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub allowed: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "must be one of: {}", self.allowed.join(", "))
    }
}

impl ActivityCategory {
    pub const ALLOWED: &'static [&'static str] =
        &["Sightseeing", "Food", "Adventure", "Culture", "Nightlife"];
}

impl FromStr for ActivityCategory {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Sightseeing" => Ok(Self::Sightseeing),
            "Food" => Ok(Self::Food),
            "Adventure" => Ok(Self::Adventure),
            "Culture" => Ok(Self::Culture),
            "Nightlife" => Ok(Self::Nightlife),
            _ => Err(UnknownVariant {
                allowed: Self::ALLOWED,
            }),
        }
    }
}

impl CostTier {
    pub const ALLOWED: &'static [&'static str] = &["Low", "Medium", "High"];
}

impl FromStr for CostTier {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            _ => Err(UnknownVariant {
                allowed: Self::ALLOWED,
            }),
        }
    }
}

impl DurationBucket {
    pub const ALLOWED: &'static [&'static str] = &["1–3 hrs", "Half-day", "Full-day"];
}

impl FromStr for DurationBucket {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            // ASCII hyphen is accepted as a spelling of the same bucket.
            "1–3 hrs" | "1-3 hrs" => Ok(Self::OneToThreeHours),
            "Half-day" => Ok(Self::HalfDay),
            "Full-day" => Ok(Self::FullDay),
            _ => Err(UnknownVariant {
                allowed: Self::ALLOWED,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city: String,
    pub category: ActivityCategory,
    pub cost: CostTier,
    pub duration: DurationBucket,
    pub rating: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: String,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub image: String,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl City {
    pub fn has_activity(&self, activity_id: &str) -> bool {
        self.activities.iter().any(|a| a.id == activity_id)
    }

    /// Drops later activities that repeat an earlier id.
    pub fn dedupe_activities(&mut self) {
        let mut seen = HashSet::new();
        self.activities.retain(|a| seen.insert(a.id.clone()));
    }
}

/// Validated input for attaching a city to a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCity {
    pub id: String,
    pub name: String,
    pub country: String,
    pub image: String,
}

/// Validated input for attaching an activity to a city. The image has
/// already been dropped to empty if it was not an image link and the
/// rating is already within range.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub id: String,
    pub name: String,
    pub city: String,
    pub category: ActivityCategory,
    pub cost: CostTier,
    pub duration: DurationBucket,
    pub rating: f64,
    pub image: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl NewActivity {
    pub fn into_activity(self, city_name: &str, now: DateTime<Utc>) -> Activity {
        Activity {
            id: self.id,
            name: self.name,
            city: if self.city.is_empty() {
                city_name.to_string()
            } else {
                self.city
            },
            category: self.category,
            cost: self.cost,
            duration: self.duration,
            rating: clamp_rating(Some(self.rating)),
            image: self.image,
            description: self.description,
            tags: self.tags,
            added_at: now,
        }
    }
}

/// Missing or non-finite ratings fall back to the default.
pub fn clamp_rating(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) if r.is_finite() => r.clamp(0.0, MAX_RATING),
        _ => DEFAULT_RATING,
    }
}
