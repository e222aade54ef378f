pub mod admin_service;
pub mod auth_service;
pub mod catalog_service;
pub mod profile_service;
pub mod stats_service;
pub mod token_service;
pub mod trip_service;

use bson::oid::ObjectId;

use crate::error::AppError;

/// Path ids that are not valid ObjectIds cannot name anything stored.
pub fn parse_id(id: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id.trim()).map_err(|_| AppError::NotFound(format!("{} not found", what)))
}
