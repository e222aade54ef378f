//! Aggregates over trips that storage backends compute for the stats
//! service. Cancelled trips count only in [`StatusBreakdown`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::trip::{Trip, TripStatus};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub planning: usize,
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusBreakdown {
    pub fn from_trips(trips: &[Trip]) -> Self {
        let mut breakdown = Self::default();
        for trip in trips {
            breakdown.add(trip.status, 1);
        }
        breakdown
    }

    pub fn add(&mut self, status: TripStatus, count: usize) {
        match status {
            TripStatus::Planning => self.planning += count,
            TripStatus::Active => self.active += count,
            TripStatus::Completed => self.completed += count,
            TripStatus::Cancelled => self.cancelled += count,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStats {
    pub total: usize,
    pub by_status: StatusBreakdown,
    pub public: usize,
}

impl TripStats {
    pub fn from_trips(trips: &[Trip]) -> Self {
        Self {
            total: counted(trips).count(),
            by_status: StatusBreakdown::from_trips(trips),
            public: counted(trips).filter(|t| t.is_public).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularDestination {
    pub name: String,
    pub country: String,
    pub trip_count: usize,
}

/// Trips that count toward every figure except the status breakdown.
pub fn counted(trips: &[Trip]) -> impl Iterator<Item = &Trip> {
    trips.iter().filter(|t| t.status != TripStatus::Cancelled)
}

/// Ranks cities by how many distinct public trips include them. Cities
/// are matched on name and country, ignoring case.
pub fn rank_destinations(trips: &[Trip], limit: usize) -> Vec<PopularDestination> {
    let mut ranking: HashMap<(String, String), PopularDestination> = HashMap::new();

    for trip in counted(trips).filter(|t| t.is_public) {
        let mut seen = HashSet::new();
        for city in &trip.selected_cities {
            let key = (city.name.to_lowercase(), city.country.to_lowercase());
            if !seen.insert(key.clone()) {
                continue;
            }
            ranking
                .entry(key)
                .or_insert_with(|| PopularDestination {
                    name: city.name.clone(),
                    country: city.country.clone(),
                    trip_count: 0,
                })
                .trip_count += 1;
        }
    }

    let mut ranked: Vec<PopularDestination> = ranking.into_values().collect();
    ranked.sort_by(|a, b| {
        b.trip_count
            .cmp(&a.trip_count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.country.cmp(&b.country))
    });
    ranked.truncate(limit);
    ranked
}
