use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::FieldErrors;
use crate::error::AppError;
use crate::models::location::Coordinates;
use crate::models::trip::budget::Currency;
use crate::models::user::{
    NotificationPreferences, Preferences, PrivacyPreferences, SavedDestination, Theme,
};
use crate::sanitize::truncate;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationInput {
    pub email: Option<bool>,
    pub push: Option<bool>,
    pub trip_reminders: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyInput {
    pub profile_public: Option<bool>,
    pub show_trips: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PreferencesInput {
    #[validate(length(min = 2, max = 10, message = "Language must be between 2 and 10 characters"))]
    pub language: Option<String>,
    #[validate(length(min = 1, max = 64, message = "Timezone must be between 1 and 64 characters"))]
    pub timezone: Option<String>,
    pub currency: Option<String>,
    pub theme: Option<Theme>,
    pub notifications: Option<NotificationInput>,
    pub privacy: Option<PrivacyInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: Option<String>,
    #[validate(nested)]
    pub preferences: Option<PreferencesInput>,
}

/// Partial profile change. Preference groups are merged field by field.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub currency: Option<Currency>,
    pub theme: Option<Theme>,
    pub notifications: NotificationInput,
    pub privacy: PrivacyInput,
}

impl ProfileUpdate {
    pub fn apply(self, name: &mut String, preferences: &mut Preferences) {
        if let Some(new_name) = self.name {
            *name = new_name;
        }
        if let Some(language) = self.language {
            preferences.language = language;
        }
        if let Some(timezone) = self.timezone {
            preferences.timezone = timezone;
        }
        if let Some(currency) = self.currency {
            preferences.currency = currency.code().to_string();
        }
        if let Some(theme) = self.theme {
            preferences.theme = theme;
        }
        merge_notifications(&mut preferences.notifications, self.notifications);
        merge_privacy(&mut preferences.privacy, self.privacy);
    }
}

fn merge_notifications(current: &mut NotificationPreferences, input: NotificationInput) {
    if let Some(email) = input.email {
        current.email = email;
    }
    if let Some(push) = input.push {
        current.push = push;
    }
    if let Some(trip_reminders) = input.trip_reminders {
        current.trip_reminders = trip_reminders;
    }
}

fn merge_privacy(current: &mut PrivacyPreferences, input: PrivacyInput) {
    if let Some(profile_public) = input.profile_public {
        current.profile_public = profile_public;
    }
    if let Some(show_trips) = input.show_trips {
        current.show_trips = show_trips;
    }
}

impl UpdateProfileRequest {
    pub fn into_command(self) -> Result<ProfileUpdate, AppError> {
        let mut errors = FieldErrors::validate(&self);
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) && !errors.has("name") {
            errors.push("name", "Name cannot be empty");
        }
        let preferences = self.preferences.unwrap_or_default();
        let currency = preferences
            .currency
            .as_deref()
            .and_then(|code| errors.parse::<Currency>("preferences.currency", code));
        errors.into_result()?;

        Ok(ProfileUpdate {
            name: self.name.map(|n| n.trim().to_string()),
            language: preferences.language.map(|l| l.trim().to_string()),
            timezone: preferences.timezone.map(|t| t.trim().to_string()),
            currency,
            theme: preferences.theme,
            notifications: preferences.notifications.unwrap_or_default(),
            privacy: preferences.privacy.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn into_command(self) -> Result<ChangePassword, AppError> {
        let mut errors = FieldErrors::validate(&self);
        if !self.current_password.is_empty() && self.current_password == self.new_password {
            errors.push(
                "newPassword",
                "New password must differ from the current password",
            );
        }
        errors.into_result()?;
        Ok(ChangePassword {
            current_password: self.current_password,
            new_password: self.new_password,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SavedDestinationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 100, message = "City must be at most 100 characters"))]
    #[serde(default)]
    pub city: String,
    #[validate(length(max = 100, message = "Country must be at most 100 characters"))]
    #[serde(default)]
    pub country: String,
    #[validate(nested)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub note: String,
}

impl SavedDestinationRequest {
    pub fn into_destination(self, now: DateTime<Utc>) -> Result<SavedDestination, AppError> {
        let mut errors = FieldErrors::validate(&self);
        if self.name.trim().is_empty() && !errors.has("name") {
            errors.push("name", "Name is required");
        }
        errors.into_result()?;

        Ok(SavedDestination {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            city: self.city.trim().to_string(),
            country: self.country.trim().to_string(),
            coordinates: self.coordinates,
            note: truncate(&self.note, 500),
            saved_at: now,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub password: String,
}

impl DeleteAccountRequest {
    pub fn into_password(self) -> Result<String, AppError> {
        if self.password.is_empty() {
            return Err(AppError::validation(
                "password",
                "Password confirmation is required",
            ));
        }
        Ok(self.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_update_merges_preferences() {
        let request: UpdateProfileRequest = serde_json::from_value(json!({
            "name": " Grace ",
            "preferences": {
                "currency": "eur",
                "theme": "dark",
                "notifications": {"push": true}
            }
        }))
        .unwrap();
        let update = request.into_command().unwrap();

        let mut name = "Old".to_string();
        let mut preferences = Preferences::default();
        update.apply(&mut name, &mut preferences);

        assert_eq!(name, "Grace");
        assert_eq!(preferences.currency, "EUR");
        assert_eq!(preferences.theme, Theme::Dark);
        assert!(preferences.notifications.push);
        assert!(preferences.notifications.email);
        assert_eq!(preferences.language, "en");
    }

    #[test]
    fn test_profile_update_rejects_unknown_currency() {
        let request: UpdateProfileRequest =
            serde_json::from_value(json!({"preferences": {"currency": "XYZ"}})).unwrap();
        match request.into_command() {
            Err(AppError::Validation(fields)) => {
                assert_eq!(fields[0].field, "preferences.currency")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_change_password_must_differ() {
        let request = ChangePasswordRequest {
            current_password: "same-password".into(),
            new_password: "same-password".into(),
        };
        assert!(matches!(
            request.into_command(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_saved_destination_gets_id() {
        let request: SavedDestinationRequest = serde_json::from_value(json!({
            "name": "Kyoto temples", "city": "Kyoto", "country": "Japan"
        }))
        .unwrap();
        let destination = request.into_destination(Utc::now()).unwrap();
        assert!(!destination.id.is_empty());
        assert_eq!(destination.city, "Kyoto");
    }
}
