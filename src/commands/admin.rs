use serde::Deserialize;
use validator::Validate;

use super::FieldErrors;
use crate::error::AppError;
use crate::models::settings::Settings;
use crate::models::user::UserRole;
use crate::sanitize::{is_image_url, truncate};

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub role: String,
}

impl UpdateRoleRequest {
    pub fn into_role(self) -> Result<UserRole, AppError> {
        let mut errors = FieldErrors::default();
        let role = errors.parse::<UserRole>("role", self.role.trim());
        errors.into_result()?;
        role.ok_or_else(|| AppError::validation("role", "Role is required"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCityRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Country must be between 1 and 100 characters"))]
    pub country: String,
    #[validate(length(max = 100, message = "Region must be at most 100 characters"))]
    #[serde(default)]
    pub region: String,
    #[validate(range(min = 0, max = 100, message = "Cost index must be between 0 and 100"))]
    #[serde(default)]
    pub cost_index: i64,
    #[validate(range(min = 0, max = 100, message = "Popularity must be between 0 and 100"))]
    #[serde(default)]
    pub popularity: i64,
    #[serde(default)]
    pub image: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub description: String,
}

/// Editable fields of a catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCityInput {
    pub name: String,
    pub country: String,
    pub region: String,
    pub cost_index: u8,
    pub popularity: u8,
    pub image: String,
    pub description: String,
}

impl CatalogCityRequest {
    pub fn into_command(self) -> Result<CatalogCityInput, AppError> {
        let mut errors = FieldErrors::validate(&self);
        for (field, value) in [("name", &self.name), ("country", &self.country)] {
            if value.trim().is_empty() && !errors.has(field) {
                errors.push(field, format!("{} is required", field));
            }
        }
        if !self.image.trim().is_empty() && !is_image_url(&self.image) {
            errors.push("image", "Image must be an image URL");
        }
        errors.into_result()?;

        Ok(CatalogCityInput {
            name: self.name.trim().to_string(),
            country: self.country.trim().to_string(),
            region: self.region.trim().to_string(),
            cost_index: self.cost_index.clamp(0, 100) as u8,
            popularity: self.popularity.clamp(0, 100) as u8,
            image: self.image.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub maintenance_mode: Option<bool>,
    #[validate(length(max = 500, message = "Maintenance message must be at most 500 characters"))]
    pub maintenance_message: Option<String>,
    pub allow_registrations: Option<bool>,
}

impl UpdateSettingsRequest {
    /// Merges the supplied switches over `current`.
    pub fn apply_to(self, current: &Settings) -> Result<Settings, AppError> {
        FieldErrors::validate(&self).into_result()?;
        let mut next = current.clone();
        if let Some(mode) = self.maintenance_mode {
            next.maintenance_mode = mode;
        }
        if let Some(message) = self.maintenance_message {
            next.maintenance_message = truncate(&message, 500);
        }
        if let Some(allow) = self.allow_registrations {
            next.allow_registrations = allow;
        }
        Ok(next)
    }
}
