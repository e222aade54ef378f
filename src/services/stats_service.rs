//! Read-only aggregates recomputed on every request.
//!
//! Cancelled trips count only in the per-status breakdown; every other
//! figure ignores them. Platform-wide figures are computed by the store.

use std::collections::BTreeMap;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Store;
use crate::error::AppError;
use crate::models::stats::{counted, PopularDestination, StatusBreakdown, TripStats};
use crate::models::trip::{DateStatus, Trip, TripQuery, TripStatus};

pub const DASHBOARD_LIST_LEN: usize = 5;
const TOP_DESTINATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyTotal {
    pub currency: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: String,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: TripStatus,
    pub date_status: DateStatus,
    pub cover_photo: String,
    pub city_count: usize,
}

impl TripSummary {
    fn new(trip: &Trip, now: DateTime<Utc>) -> Self {
        Self {
            id: trip.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: trip.name.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            status: trip.status,
            date_status: trip.date_status(now),
            cover_photo: trip.cover_photo.clone(),
            city_count: trip.selected_cities.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_trips: usize,
    pub status_breakdown: StatusBreakdown,
    pub upcoming_trips: usize,
    pub ongoing_trips: usize,
    pub planned_budget: Vec<CurrencyTotal>,
    pub total_cities: usize,
    pub total_activities: usize,
    pub upcoming: Vec<TripSummary>,
    pub recent: Vec<TripSummary>,
}

pub fn dashboard(trips: &[Trip], now: DateTime<Utc>) -> Dashboard {
    let mut planned: BTreeMap<&str, f64> = BTreeMap::new();
    for trip in counted(trips) {
        *planned.entry(trip.budget.currency.code()).or_default() += trip.budget.amount;
    }

    let mut upcoming: Vec<&Trip> = counted(trips)
        .filter(|t| t.date_status(now) == DateStatus::Upcoming)
        .collect();
    upcoming.sort_by_key(|t| t.start_date);

    let mut recent: Vec<&Trip> = counted(trips).collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Dashboard {
        total_trips: counted(trips).count(),
        status_breakdown: StatusBreakdown::from_trips(trips),
        upcoming_trips: upcoming.len(),
        ongoing_trips: counted(trips)
            .filter(|t| t.date_status(now) == DateStatus::Ongoing)
            .count(),
        planned_budget: planned
            .into_iter()
            .map(|(currency, amount)| CurrencyTotal {
                currency: currency.to_string(),
                amount,
            })
            .collect(),
        total_cities: counted(trips).map(|t| t.selected_cities.len()).sum(),
        total_activities: counted(trips).map(Trip::activity_count).sum(),
        upcoming: upcoming
            .into_iter()
            .take(DASHBOARD_LIST_LEN)
            .map(|t| TripSummary::new(t, now))
            .collect(),
        recent: recent
            .into_iter()
            .take(DASHBOARD_LIST_LEN)
            .map(|t| TripSummary::new(t, now))
            .collect(),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyBudget {
    pub currency: String,
    pub trip_count: usize,
    pub planned: f64,
    pub transport: f64,
    pub stay: f64,
    pub activities: f64,
    pub meals: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripBudget {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub planned: f64,
    pub spent: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetOverview {
    pub currencies: Vec<CurrencyBudget>,
    pub trips: Vec<TripBudget>,
}

/// Groups by the trip budget's currency; amounts in different currencies
/// are never added together.
pub fn budget_overview(trips: &[Trip]) -> BudgetOverview {
    let mut groups: BTreeMap<&str, CurrencyBudget> = BTreeMap::new();
    let mut per_trip = Vec::new();

    for trip in counted(trips) {
        let code = trip.budget.currency.code();
        let summary = &trip.budget_summary;
        let group = groups.entry(code).or_insert_with(|| CurrencyBudget {
            currency: code.to_string(),
            ..CurrencyBudget::default()
        });
        group.trip_count += 1;
        group.planned += trip.budget.amount;
        group.transport += summary.transport;
        group.stay += summary.stay;
        group.activities += summary.activities;
        group.meals += summary.meals;
        group.total += summary.total;

        per_trip.push(TripBudget {
            id: trip.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: trip.name.clone(),
            currency: code.to_string(),
            planned: trip.budget.amount,
            spent: summary.total,
            remaining: trip.budget.amount - summary.total,
        });
    }

    BudgetOverview {
        currencies: groups.into_values().collect(),
        trips: per_trip,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub admins: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub users: UserStats,
    pub trips: TripStats,
    pub catalog_cities: u64,
    pub top_destinations: Vec<PopularDestination>,
}

pub struct StatsService<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> StatsService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn dashboard(&self, user_id: &ObjectId) -> Result<Dashboard, AppError> {
        let trips = self.store.all_trips(&TripQuery::owned_by(*user_id)).await?;
        Ok(dashboard(&trips, Utc::now()))
    }

    pub async fn budget_overview(&self, user_id: &ObjectId) -> Result<BudgetOverview, AppError> {
        let trips = self.store.all_trips(&TripQuery::owned_by(*user_id)).await?;
        Ok(budget_overview(&trips))
    }

    pub async fn popular_destinations(
        &self,
        limit: usize,
    ) -> Result<Vec<PopularDestination>, AppError> {
        Ok(self.store.popular_destinations(limit).await?)
    }

    pub async fn platform(&self) -> Result<PlatformStats, AppError> {
        let trips = self.store.trip_stats().await?;
        let users = self.store.count_users().await?;
        let catalog_cities = self.store.count_cities().await?;
        let top_destinations = self.store.popular_destinations(TOP_DESTINATIONS).await?;

        Ok(PlatformStats {
            users: UserStats {
                total: users.total,
                active: users.active,
                admins: users.admins,
            },
            trips,
            catalog_cities,
            top_destinations,
        })
    }
}
