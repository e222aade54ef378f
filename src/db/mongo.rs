use std::time::Duration;

use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    error::{ErrorKind, WriteError, WriteFailure},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, IndexModel,
};

use crate::db::{
    CatalogStore, SettingsStore, StoreError, StoreResult, TripStore, UserCounts, UserStore,
};
use crate::models::catalog::{CatalogCity, CatalogQuery};
use crate::models::pagination::Page;
use crate::models::settings::{Settings, SETTINGS_ID};
use crate::models::stats::{PopularDestination, TripStats};
use crate::models::trip::{Trip, TripQuery, TripStatus};
use crate::models::user::{RefreshToken, User, UserQuery, UserRole, MAX_SESSIONS};
use crate::sanitize::search_pattern;

pub const CONNECT_ATTEMPTS: u32 = 5;
pub const CONNECT_BACKOFF: Duration = Duration::from_secs(2);

const DUPLICATE_KEY: i32 = 11000;

/// User fields that are omitted from the document when `None`.
const USER_OPTIONAL_FIELDS: &[&str] = &["passwordResetToken", "passwordResetExpires", "lastLogin"];

pub async fn create_mongo_client(uri: &str) -> Result<Client, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;

    Ok(client)
}

/// Tries `attempts` times, sleeping `backoff` between failures, and returns
/// the last error when every attempt fails.
pub async fn connect_with_retry(
    uri: &str,
    attempts: u32,
    backoff: Duration,
) -> Result<Client, mongodb::error::Error> {
    let mut attempt = 1;
    loop {
        match create_mongo_client(uri).await {
            Ok(client) => {
                log::info!("Connected to MongoDB on attempt {}", attempt);
                return Ok(client);
            }
            Err(err) if attempt < attempts => {
                log::warn!(
                    "MongoDB connection attempt {}/{} failed: {}",
                    attempt,
                    attempts,
                    err
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => {
                log::error!("MongoDB connection failed after {} attempts", attempts);
                return Err(err);
            }
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code, .. })) if *code == DUPLICATE_KEY
    )
}

fn inserted_id(result: mongodb::results::InsertOneResult) -> StoreResult<ObjectId> {
    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| StoreError::Database("Inserted id is not an ObjectId".to_string()))
}

fn contains_ci(term: &str) -> Document {
    doc! { "$regex": search_pattern(term), "$options": "i" }
}

#[derive(Clone)]
pub struct MongoStore {
    users: Collection<User>,
    trips: Collection<Trip>,
    cities: Collection<CatalogCity>,
    settings: Collection<Settings>,
}

impl MongoStore {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        Self {
            users: db.collection("users"),
            trips: db.collection("trips"),
            cities: db.collection("cities"),
            settings: db.collection("settings"),
        }
    }

    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.cities
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1, "country": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.trips
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user": 1, "createdAt": -1 })
                    .build(),
            )
            .await?;
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "passwordResetToken": 1 })
                    .build(),
            )
            .await?;

        log::info!("MongoDB indexes ensured");
        Ok(())
    }

    fn trip_filter(query: &TripQuery) -> Document {
        let mut filter = Document::new();
        if let Some(owner) = query.owner {
            filter.insert("user", owner);
        }
        if let Some(status) = query.status {
            filter.insert("status", status.as_str());
        }
        if query.public_only {
            filter.insert("isPublic", true);
        }
        if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
            filter.insert("name", contains_ci(term));
        }
        filter
    }

    fn user_filter(query: &UserQuery) -> Document {
        let mut filter = Document::new();
        if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
            filter.insert(
                "$or",
                vec![
                    doc! { "name": contains_ci(term) },
                    doc! { "email": contains_ci(term) },
                ],
            );
        }
        if let Some(role) = query.role {
            filter.insert("role", role.as_str());
        }
        filter
    }

    fn catalog_filter(query: &CatalogQuery) -> Document {
        let mut filter = Document::new();
        if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
            filter.insert(
                "$or",
                vec![
                    doc! { "name": contains_ci(term) },
                    doc! { "country": contains_ci(term) },
                ],
            );
        }
        if let Some(region) = query.region.as_deref().filter(|r| !r.trim().is_empty()) {
            filter.insert(
                "region",
                doc! { "$regex": format!("^{}$", search_pattern(region)), "$options": "i" },
            );
        }
        filter
    }
}

impl TripStore for MongoStore {
    async fn insert_trip(&self, trip: &Trip) -> StoreResult<ObjectId> {
        let result = self.trips.insert_one(trip).await?;
        inserted_id(result)
    }

    async fn find_trip(&self, id: &ObjectId) -> StoreResult<Option<Trip>> {
        Ok(self.trips.find_one(doc! { "_id": *id }).await?)
    }

    async fn save_trip(&self, trip: &Trip) -> StoreResult<()> {
        let id = trip.id.ok_or(StoreError::NotFound("Trip"))?;
        let result = self.trips.replace_one(doc! { "_id": id }, trip).await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("Trip"));
        }
        Ok(())
    }

    async fn delete_trip(&self, id: &ObjectId) -> StoreResult<bool> {
        let result = self.trips.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn delete_trips_by_user(&self, user: &ObjectId) -> StoreResult<u64> {
        let result = self.trips.delete_many(doc! { "user": *user }).await?;
        Ok(result.deleted_count)
    }

    async fn latest_trip_for_user(&self, user: &ObjectId) -> StoreResult<Option<Trip>> {
        // ObjectIds grow with insertion time, so `_id` orders by creation.
        Ok(self
            .trips
            .find_one(doc! { "user": *user })
            .sort(doc! { "_id": -1 })
            .await?)
    }

    async fn list_trips(&self, query: &TripQuery, page: Page) -> StoreResult<(Vec<Trip>, u64)> {
        let filter = Self::trip_filter(query);
        let total = self.trips.count_documents(filter.clone()).await?;
        let trips: Vec<Trip> = self
            .trips
            .find(filter)
            .sort(doc! { "_id": -1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok((trips, total))
    }

    async fn all_trips(&self, query: &TripQuery) -> StoreResult<Vec<Trip>> {
        let trips: Vec<Trip> = self
            .trips
            .find(Self::trip_filter(query))
            .sort(doc! { "_id": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(trips)
    }

    async fn popular_destinations(&self, limit: usize) -> StoreResult<Vec<PopularDestination>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let pipeline = vec![
            doc! { "$match": {
                "isPublic": true,
                "status": { "$ne": TripStatus::Cancelled.as_str() }
            } },
            doc! { "$unwind": "$selectedCities" },
            // One row per trip and place, ignoring case.
            doc! { "$group": {
                "_id": {
                    "trip": "$_id",
                    "name": { "$toLower": "$selectedCities.name" },
                    "country": { "$toLower": "$selectedCities.country" }
                },
                "name": { "$first": "$selectedCities.name" },
                "country": { "$first": "$selectedCities.country" }
            } },
            doc! { "$group": {
                "_id": { "name": "$_id.name", "country": "$_id.country" },
                "name": { "$first": "$name" },
                "country": { "$first": "$country" },
                "tripCount": { "$sum": 1 }
            } },
            doc! { "$sort": { "tripCount": -1, "name": 1, "country": 1 } },
            doc! { "$limit": limit as i64 },
            doc! { "$project": { "_id": 0, "name": 1, "country": 1, "tripCount": 1 } },
        ];
        let rows: Vec<Document> = self.trips.aggregate(pipeline).await?.try_collect().await?;
        rows.into_iter()
            .map(|row| {
                bson::from_document(row).map_err(|err| StoreError::Database(err.to_string()))
            })
            .collect()
    }

    async fn trip_stats(&self) -> StoreResult<TripStats> {
        let pipeline = vec![doc! { "$group": {
            "_id": "$status",
            "count": { "$sum": 1 },
            "public": { "$sum": { "$cond": ["$isPublic", 1, 0] } }
        } }];
        let rows: Vec<Document> = self.trips.aggregate(pipeline).await?.try_collect().await?;

        let mut stats = TripStats::default();
        for row in rows {
            // Documents without a status deserialize as planning.
            let status = row
                .get_str("_id")
                .ok()
                .and_then(|s| s.parse::<TripStatus>().ok())
                .unwrap_or_default();
            let count = count_field(&row, "count");
            stats.by_status.add(status, count);
            if status != TripStatus::Cancelled {
                stats.total += count;
                stats.public += count_field(&row, "public");
            }
        }
        Ok(stats)
    }
}

fn count_field(row: &Document, key: &str) -> usize {
    match row.get(key) {
        Some(Bson::Int32(n)) => (*n).max(0) as usize,
        Some(Bson::Int64(n)) => (*n).max(0) as usize,
        _ => 0,
    }
}

impl UserStore for MongoStore {
    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId> {
        match self.users.insert_one(user).await {
            Ok(result) => inserted_id(result),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::Duplicate("User")),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "_id": *id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn find_user_by_reset_token(
        &self,
        token_hash: &str,
        now_ts: i64,
    ) -> StoreResult<Option<User>> {
        let filter = doc! {
            "passwordResetToken": token_hash,
            "passwordResetExpires": { "$gt": now_ts },
        };
        Ok(self.users.find_one(filter).await?)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let id = user.id.ok_or(StoreError::NotFound("User"))?;
        let mut fields =
            bson::to_document(user).map_err(|err| StoreError::Database(err.to_string()))?;
        fields.remove("_id");
        fields.remove("refreshTokens");
        let unset: Document = USER_OPTIONAL_FIELDS
            .iter()
            .filter(|key| !fields.contains_key(**key))
            .map(|key| (key.to_string(), Bson::String(String::new())))
            .collect();
        let mut update = doc! { "$set": fields };
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }
        match self.users.update_one(doc! { "_id": id }, update).await {
            Ok(result) if result.matched_count == 0 => Err(StoreError::NotFound("User")),
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::Duplicate("User")),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_user(&self, id: &ObjectId) -> StoreResult<bool> {
        let result = self.users.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_users(&self, query: &UserQuery, page: Page) -> StoreResult<(Vec<User>, u64)> {
        let filter = Self::user_filter(query);
        let total = self.users.count_documents(filter.clone()).await?;
        let users: Vec<User> = self
            .users
            .find(filter)
            .sort(doc! { "_id": -1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok((users, total))
    }

    async fn count_users(&self) -> StoreResult<UserCounts> {
        let admin_roles = vec![UserRole::Admin.as_str(), UserRole::SuperAdmin.as_str()];
        Ok(UserCounts {
            total: self.users.count_documents(doc! {}).await?,
            active: self.users.count_documents(doc! { "isActive": true }).await?,
            admins: self
                .users
                .count_documents(doc! { "role": { "$in": admin_roles } })
                .await?,
        })
    }

    async fn push_refresh_token(
        &self,
        user: &ObjectId,
        token: RefreshToken,
        now_ts: i64,
    ) -> StoreResult<()> {
        // A single update cannot both $pull and $push the same array.
        self.users
            .update_one(
                doc! { "_id": *user },
                doc! { "$pull": { "refreshTokens": { "expiresAt": { "$lte": now_ts } } } },
            )
            .await?;

        let slice = -(MAX_SESSIONS as i32);
        let result = self
            .users
            .update_one(
                doc! { "_id": *user },
                doc! {
                    "$push": {
                        "refreshTokens": {
                            "$each": [{ "token": token.token.as_str(), "expiresAt": token.expires_at }],
                            "$slice": slice,
                        }
                    }
                },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    async fn take_refresh_token(&self, user: &ObjectId, token: &str) -> StoreResult<bool> {
        let result = self
            .users
            .update_one(
                doc! { "_id": *user, "refreshTokens.token": token },
                doc! { "$pull": { "refreshTokens": { "token": token } } },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn clear_refresh_tokens(&self, user: &ObjectId) -> StoreResult<()> {
        self.users
            .update_one(
                doc! { "_id": *user },
                doc! { "$set": { "refreshTokens": [] } },
            )
            .await?;
        Ok(())
    }
}

impl CatalogStore for MongoStore {
    async fn insert_city(&self, city: &CatalogCity) -> StoreResult<ObjectId> {
        match self.cities.insert_one(city).await {
            Ok(result) => inserted_id(result),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::Duplicate("City")),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_city(&self, id: &ObjectId) -> StoreResult<Option<CatalogCity>> {
        Ok(self.cities.find_one(doc! { "_id": *id }).await?)
    }

    async fn save_city(&self, city: &CatalogCity) -> StoreResult<()> {
        let id = city.id.ok_or(StoreError::NotFound("City"))?;
        match self.cities.replace_one(doc! { "_id": id }, city).await {
            Ok(result) if result.matched_count == 0 => Err(StoreError::NotFound("City")),
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::Duplicate("City")),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_city(&self, id: &ObjectId) -> StoreResult<bool> {
        let result = self.cities.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_cities(
        &self,
        query: &CatalogQuery,
        page: Page,
    ) -> StoreResult<(Vec<CatalogCity>, u64)> {
        let filter = Self::catalog_filter(query);
        let total = self.cities.count_documents(filter.clone()).await?;
        let cities: Vec<CatalogCity> = self
            .cities
            .find(filter)
            .sort(doc! { "popularity": -1, "name": 1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok((cities, total))
    }

    async fn count_cities(&self) -> StoreResult<u64> {
        Ok(self.cities.count_documents(doc! {}).await?)
    }
}

impl SettingsStore for MongoStore {
    async fn load_settings(&self) -> StoreResult<Settings> {
        Ok(self
            .settings
            .find_one(doc! { "_id": SETTINGS_ID })
            .await?
            .unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.settings
            .replace_one(doc! { "_id": SETTINGS_ID }, settings)
            .upsert(true)
            .await?;
        Ok(())
    }
}
