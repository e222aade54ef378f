use chrono::Utc;

use super::parse_id;
use crate::commands::admin::UpdateSettingsRequest;
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::pagination::Page;
use crate::models::settings::Settings;
use crate::models::trip::{Trip, TripQuery};
use crate::models::user::{User, UserQuery, UserRole};

const USER: &str = "User";

/// Back-office operations. Callers have already passed the admin role
/// gate; rules that depend on who the actor is are enforced here.
pub struct AdminService<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> AdminService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn list_users(
        &self,
        query: &UserQuery,
        page: Page,
    ) -> Result<(Vec<User>, u64), AppError> {
        Ok(self.store.list_users(query, page).await?)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, AppError> {
        let id = parse_id(id, USER)?;
        self.store
            .find_user(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Loads a user the actor is allowed to manage. Nobody manages their
    /// own account here, and only a superadmin manages another superadmin.
    async fn load_managed(
        &self,
        actor: &AuthenticatedUser,
        id: &str,
        self_message: &str,
    ) -> Result<User, AppError> {
        let user = self.get_user(id).await?;
        if user.object_id() == actor.user_id {
            return Err(AppError::Forbidden(self_message.to_string()));
        }
        if user.role == UserRole::SuperAdmin && actor.role != UserRole::SuperAdmin {
            return Err(AppError::Forbidden(
                "Only a superadmin can manage a superadmin account".to_string(),
            ));
        }
        Ok(user)
    }

    pub async fn update_role(
        &self,
        actor: &AuthenticatedUser,
        id: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        if actor.role != UserRole::SuperAdmin {
            return Err(AppError::Forbidden(
                "Only a superadmin can change roles".to_string(),
            ));
        }
        let mut user = self
            .load_managed(actor, id, "You cannot change your own role")
            .await?;
        user.role = role;
        user.updated_at = Utc::now();
        self.store.save_user(&user).await?;
        log::info!(
            "{} changed role of {} to {}",
            actor.email,
            user.object_id(),
            role
        );
        Ok(user)
    }

    /// Deactivation also signs the user out everywhere.
    pub async fn set_active(
        &self,
        actor: &AuthenticatedUser,
        id: &str,
        is_active: bool,
    ) -> Result<User, AppError> {
        let mut user = self
            .load_managed(actor, id, "You cannot change the status of your own account")
            .await?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        self.store.save_user(&user).await?;
        if !is_active {
            self.store.clear_refresh_tokens(&user.object_id()).await?;
        }
        log::info!(
            "{} set active={} on user {}",
            actor.email,
            is_active,
            user.object_id()
        );
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &AuthenticatedUser, id: &str) -> Result<(), AppError> {
        let user = self
            .load_managed(actor, id, "You cannot delete your own account here")
            .await?;
        let user_id = user.object_id();
        let trips = self.store.delete_trips_by_user(&user_id).await?;
        self.store.delete_user(&user_id).await?;
        log::info!(
            "{} deleted user {} and {} trips",
            actor.email,
            user_id,
            trips
        );
        Ok(())
    }

    pub async fn list_trips(
        &self,
        query: &TripQuery,
        page: Page,
    ) -> Result<(Vec<Trip>, u64), AppError> {
        Ok(self.store.list_trips(query, page).await?)
    }

    pub async fn delete_trip(&self, actor: &AuthenticatedUser, id: &str) -> Result<(), AppError> {
        let trip_id = parse_id(id, "Trip")?;
        if !self.store.delete_trip(&trip_id).await? {
            return Err(AppError::NotFound("Trip not found".to_string()));
        }
        log::info!("{} deleted trip {}", actor.email, trip_id);
        Ok(())
    }

    pub async fn settings(&self) -> Result<Settings, AppError> {
        Ok(self.store.load_settings().await?)
    }

    pub async fn update_settings(
        &self,
        actor: &AuthenticatedUser,
        request: UpdateSettingsRequest,
    ) -> Result<Settings, AppError> {
        let current = self.store.load_settings().await?;
        let mut next = request.apply_to(&current)?;
        next.updated_at = Some(Utc::now());
        next.updated_by = Some(actor.email.clone());
        self.store.save_settings(&next).await?;
        log::info!(
            "{} updated settings: maintenance={} registrations={}",
            actor.email,
            next.maintenance_mode,
            next.allow_registrations
        );
        Ok(next)
    }
}
