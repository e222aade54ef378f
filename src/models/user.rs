use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::Coordinates;
use crate::models::trip::city::UnknownVariant;

/// Most concurrent sessions kept per user; the oldest are dropped first.
pub const MAX_SESSIONS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub const ALLOWED: &'static [&'static str] = &["user", "admin", "superadmin"];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "superadmin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }

    /// Whether this role passes a gate that requires `required`.
    pub fn satisfies(&self, required: UserRole) -> bool {
        match required {
            UserRole::User => true,
            UserRole::Admin => self.is_admin(),
            UserRole::SuperAdmin => *self == UserRole::SuperAdmin,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            "superadmin" => Ok(UserRole::SuperAdmin),
            _ => Err(UnknownVariant {
                allowed: Self::ALLOWED,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub email: bool,
    pub push: bool,
    pub trip_reminders: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: false,
            trip_reminders: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPreferences {
    pub profile_public: bool,
    pub show_trips: bool,
}

impl Default for PrivacyPreferences {
    fn default() -> Self {
        Self {
            profile_public: false,
            show_trips: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub language: String,
    pub timezone: String,
    pub currency: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub notifications: NotificationPreferences,
    #[serde(default)]
    pub privacy: PrivacyPreferences,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            timezone: "UTC".to_string(),
            currency: "USD".to_string(),
            theme: Theme::default(),
            notifications: NotificationPreferences::default(),
            privacy: PrivacyPreferences::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDestination {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub note: String,
    pub saved_at: DateTime<Utc>,
}

impl SavedDestination {
    pub fn same_place(&self, name: &str, city: &str, country: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            && self.city.eq_ignore_ascii_case(city)
            && self.country.eq_ignore_ascii_case(country)
    }
}

/// A currently valid refresh token; `expires_at` is unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password: String, // Always hashed
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub saved_destinations: Vec<SavedDestination>,
    #[serde(default)]
    pub refresh_tokens: Vec<RefreshToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_expires: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name,
            email,
            password: password_hash,
            role: UserRole::User,
            is_active: true,
            preferences: Preferences::default(),
            saved_destinations: Vec::new(),
            refresh_tokens: Vec::new(),
            password_reset_token: None,
            password_reset_expires: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.id.unwrap_or_default()
    }

    pub fn clear_password_reset(&mut self) {
        self.password_reset_token = None;
        self.password_reset_expires = None;
    }
}

/// Drops expired tokens and keeps only the newest `MAX_SESSIONS - 1` so
/// that one more can be appended.
pub fn prune_sessions(tokens: &mut Vec<RefreshToken>, now_ts: i64) {
    tokens.retain(|t| t.expires_at > now_ts);
    let keep = MAX_SESSIONS - 1;
    if tokens.len() > keep {
        let excess = tokens.len() - keep;
        tokens.drain(..excess);
    }
}

/// What clients see of a user; never includes secrets.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub preferences: Preferences,
    pub saved_destinations: Vec<SavedDestination>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.object_id().to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            preferences: user.preferences.clone(),
            saved_destinations: user.saved_destinations.clone(),
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// Filters for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role: Option<UserRole>,
}
