use bson::oid::ObjectId;
use chrono::Utc;

use crate::commands::profile::{ChangePassword, ProfileUpdate};
use crate::db::Store;
use crate::error::AppError;
use crate::models::user::{SavedDestination, User};
use crate::services::auth_service::{hash_password, verify_password, AuthService, AuthSession};
use crate::services::token_service::TokenService;

pub struct ProfileService<'a, S: Store> {
    store: &'a S,
    tokens: &'a TokenService,
    bcrypt_cost: u32,
}

impl<'a, S: Store> ProfileService<'a, S> {
    pub fn new(store: &'a S, tokens: &'a TokenService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    pub async fn get(&self, user_id: &ObjectId) -> Result<User, AppError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update(&self, user_id: &ObjectId, update: ProfileUpdate) -> Result<User, AppError> {
        let mut user = self.get(user_id).await?;
        update.apply(&mut user.name, &mut user.preferences);
        user.updated_at = Utc::now();
        self.store.save_user(&user).await?;
        Ok(user)
    }

    /// Requires the current password, revokes every session and starts a
    /// fresh one.
    pub async fn change_password(
        &self,
        user_id: &ObjectId,
        cmd: ChangePassword,
    ) -> Result<AuthSession, AppError> {
        let mut user = self.get(user_id).await?;
        if !verify_password(&cmd.current_password, &user.password) {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        user.password = hash_password(&cmd.new_password, self.bcrypt_cost)?;
        user.updated_at = Utc::now();
        self.store.save_user(&user).await?;
        self.store.clear_refresh_tokens(user_id).await?;
        log::info!("Password changed for user {}", user_id);

        AuthService::new(self.store, self.tokens, self.bcrypt_cost)
            .start_session(&user)
            .await
    }

    pub async fn destinations(&self, user_id: &ObjectId) -> Result<Vec<SavedDestination>, AppError> {
        Ok(self.get(user_id).await?.saved_destinations)
    }

    pub async fn add_destination(
        &self,
        user_id: &ObjectId,
        destination: SavedDestination,
    ) -> Result<Vec<SavedDestination>, AppError> {
        let mut user = self.get(user_id).await?;
        if user
            .saved_destinations
            .iter()
            .any(|d| d.same_place(&destination.name, &destination.city, &destination.country))
        {
            return Err(AppError::Conflict("Destination already saved".to_string()));
        }
        user.saved_destinations.push(destination);
        user.updated_at = Utc::now();
        self.store.save_user(&user).await?;
        Ok(user.saved_destinations)
    }

    pub async fn remove_destination(
        &self,
        user_id: &ObjectId,
        destination_id: &str,
    ) -> Result<Vec<SavedDestination>, AppError> {
        let mut user = self.get(user_id).await?;
        let before = user.saved_destinations.len();
        user.saved_destinations.retain(|d| d.id != destination_id);
        if user.saved_destinations.len() == before {
            return Err(AppError::NotFound(
                "Saved destination not found".to_string(),
            ));
        }
        user.updated_at = Utc::now();
        self.store.save_user(&user).await?;
        Ok(user.saved_destinations)
    }

    /// Removes the account and every trip it owns.
    pub async fn delete_account(&self, user_id: &ObjectId, password: &str) -> Result<(), AppError> {
        let user = self.get(user_id).await?;
        if !verify_password(password, &user.password) {
            return Err(AppError::Unauthorized("Password is incorrect".to_string()));
        }
        let trips = self.store.delete_trips_by_user(user_id).await?;
        self.store.delete_user(user_id).await?;
        log::info!("Deleted account {} and {} trips", user_id, trips);
        Ok(())
    }
}
