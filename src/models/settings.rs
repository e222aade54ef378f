use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SETTINGS_ID: &str = "global";

/// Admin-configurable switches shared by every request. Persisted as a
/// single record so all server instances observe the same values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(rename = "_id")]
    pub id: String,
    pub maintenance_mode: bool,
    #[serde(default)]
    pub maintenance_message: String,
    pub allow_registrations: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            maintenance_mode: false,
            maintenance_message: String::new(),
            allow_registrations: true,
            updated_at: None,
            updated_by: None,
        }
    }
}
