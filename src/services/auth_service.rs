use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::commands::auth::{Login, ResetPassword, Signup};
use crate::config::AdminBootstrap;
use crate::db::Store;
use crate::error::AppError;
use crate::models::user::{User, UserRole, UserView};
use crate::sanitize::normalize_email;
use crate::services::token_service::{
    generate_reset_token, hash_reset_token, TokenPair, TokenService, RESET_TOKEN_TTL_MINUTES,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const ACCOUNT_DEACTIVATED: &str = "Account has been deactivated";
const INVALID_RESET_TOKEN: &str = "Token is invalid or has expired";
const DEFAULT_MAINTENANCE_MESSAGE: &str = "The service is under maintenance, please try again later";

/// Tokens plus the user they were issued for, as returned by every
/// endpoint that starts a session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserView,
}

pub fn hash_password(plain: &str, cost: u32) -> Result<String, AppError> {
    Ok(bcrypt::hash(plain, cost)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

pub struct AuthService<'a, S: Store> {
    store: &'a S,
    tokens: &'a TokenService,
    bcrypt_cost: u32,
}

impl<'a, S: Store> AuthService<'a, S> {
    pub fn new(store: &'a S, tokens: &'a TokenService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    /// Issues a token pair for `user` and records the refresh token.
    pub async fn start_session(&self, user: &User) -> Result<AuthSession, AppError> {
        let now = Utc::now();
        let (pair, refresh) = self.tokens.issue_pair(user, now)?;
        self.store
            .push_refresh_token(&user.object_id(), refresh, now.timestamp())
            .await?;
        Ok(AuthSession {
            tokens: pair,
            user: UserView::from(user),
        })
    }

    pub async fn signup(&self, cmd: Signup) -> Result<AuthSession, AppError> {
        let settings = self.store.load_settings().await?;
        if settings.maintenance_mode {
            return Err(maintenance_error(&settings.maintenance_message));
        }
        if !settings.allow_registrations {
            return Err(AppError::ServiceUnavailable(
                "Registrations are currently disabled".to_string(),
            ));
        }

        if self.store.find_user_by_email(&cmd.email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password = hash_password(&cmd.password, self.bcrypt_cost)?;
        let mut user = User::new(cmd.name, cmd.email, password, Utc::now());
        user.id = Some(self.store.insert_user(&user).await?);
        log::info!("New account registered: {}", user.object_id());

        self.start_session(&user).await
    }

    pub async fn login(&self, cmd: Login) -> Result<AuthSession, AppError> {
        let Some(mut user) = self.store.find_user_by_email(&cmd.email).await? else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !verify_password(&cmd.password, &user.password) {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        if !user.is_active {
            return Err(AppError::Unauthorized(ACCOUNT_DEACTIVATED.to_string()));
        }

        let settings = self.store.load_settings().await?;
        if settings.maintenance_mode && !user.role.is_admin() {
            return Err(maintenance_error(&settings.maintenance_message));
        }

        let now = Utc::now();
        user.last_login = Some(now);
        user.updated_at = now;
        self.store.save_user(&user).await?;

        self.start_session(&user).await
    }

    /// Rotates a refresh token: the presented token is consumed and a new
    /// pair is issued. A token can be exchanged at most once.
    pub async fn refresh(&self, token: &str) -> Result<AuthSession, AppError> {
        let claims = self.tokens.verify_refresh(token)?;
        let user_id = ObjectId::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        if !self.store.take_refresh_token(&user_id, token).await? {
            log::warn!("Refresh token reuse or revoked token for user {}", user_id);
            return Err(AppError::Unauthorized(
                "Refresh token is invalid or has been revoked".to_string(),
            ));
        }

        let user = self
            .store
            .find_user(&user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;
        if !user.is_active {
            return Err(AppError::Unauthorized(ACCOUNT_DEACTIVATED.to_string()));
        }

        self.start_session(&user).await
    }

    /// Revokes the presented refresh token. Succeeds even when the token
    /// was already gone.
    pub async fn logout(&self, user_id: &ObjectId, token: &str) -> Result<(), AppError> {
        self.store.take_refresh_token(user_id, token).await?;
        Ok(())
    }

    pub async fn current_user(&self, user_id: &ObjectId) -> Result<User, AppError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Starts a password reset for an existing active account. Returns the
    /// raw token when one was generated; callers must not reveal whether
    /// that happened.
    pub async fn forgot_password(
        &self,
        email: &str,
        client_url: &str,
    ) -> Result<Option<String>, AppError> {
        let Some(mut user) = self.store.find_user_by_email(email).await? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        let now = Utc::now();
        let (raw, hash) = generate_reset_token();
        user.password_reset_token = Some(hash);
        user.password_reset_expires =
            Some((now + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).timestamp());
        user.updated_at = now;
        self.store.save_user(&user).await?;

        if cfg!(debug_assertions) {
            log::info!(
                "Password reset link for {}: {}/reset-password/{}",
                user.email,
                client_url.trim_end_matches('/'),
                raw
            );
        }
        Ok(Some(raw))
    }

    /// Sets a new password from a reset token and signs out every session.
    pub async fn reset_password(&self, cmd: ResetPassword) -> Result<(), AppError> {
        let now = Utc::now();
        let hash = hash_reset_token(&cmd.token);
        let mut user = self
            .store
            .find_user_by_reset_token(&hash, now.timestamp())
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_RESET_TOKEN.to_string()))?;

        user.password = hash_password(&cmd.password, self.bcrypt_cost)?;
        user.clear_password_reset();
        user.updated_at = now;
        self.store.save_user(&user).await?;
        self.store.clear_refresh_tokens(&user.object_id()).await?;

        log::info!("Password reset completed for user {}", user.object_id());
        Ok(())
    }

    /// Creates the configured superadmin unless an account with that
    /// email exists. Returns whether an account was created.
    pub async fn bootstrap_admin(&self, admin: &AdminBootstrap) -> Result<bool, AppError> {
        let email = normalize_email(&admin.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        let password = hash_password(&admin.password, self.bcrypt_cost)?;
        let mut user = User::new(admin.name.clone(), email, password, Utc::now());
        user.role = UserRole::SuperAdmin;
        let id = self.store.insert_user(&user).await?;
        log::info!("Bootstrapped superadmin account {}", id);
        Ok(true)
    }
}

fn maintenance_error(message: &str) -> AppError {
    let message = if message.trim().is_empty() {
        DEFAULT_MAINTENANCE_MESSAGE
    } else {
        message
    };
    AppError::ServiceUnavailable(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::memory::MemoryStore;
    use crate::db::{SettingsStore, UserStore};
    use crate::models::settings::Settings;

    fn signup_cmd(email: &str) -> Signup {
        Signup {
            name: "Ada".into(),
            email: email.into(),
            password: "password123".into(),
        }
    }

    fn login_cmd(email: &str, password: &str) -> Login {
        Login {
            email: email.into(),
            password: password.into(),
        }
    }

    fn setup() -> (MemoryStore, TokenService) {
        (MemoryStore::new(), TokenService::new(&Config::default()))
    }

    #[actix_rt::test]
    async fn test_signup_then_login() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);

        let session = auth.signup(signup_cmd("ada@example.com")).await.unwrap();
        assert_eq!(session.user.email, "ada@example.com");

        let session = auth
            .login(login_cmd("ada@example.com", "password123"))
            .await
            .unwrap();
        let user_id = ObjectId::parse_str(&session.user.id).unwrap();
        let user = store.find_user(&user_id).await.unwrap().unwrap();
        assert!(user.last_login.is_some());
        assert_eq!(user.refresh_tokens.len(), 2);
    }

    #[actix_rt::test]
    async fn test_duplicate_signup_conflicts() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        auth.signup(signup_cmd("ada@example.com")).await.unwrap();
        assert!(matches!(
            auth.signup(signup_cmd("ada@example.com")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_generic() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        auth.signup(signup_cmd("ada@example.com")).await.unwrap();

        for cmd in [
            login_cmd("ada@example.com", "wrong-password"),
            login_cmd("nobody@example.com", "password123"),
        ] {
            match auth.login(cmd).await {
                Err(AppError::Unauthorized(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
                other => panic!("unexpected {:?}", other.map(|s| s.user.email)),
            }
        }
    }

    #[actix_rt::test]
    async fn test_deactivated_account_cannot_login() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        auth.signup(signup_cmd("ada@example.com")).await.unwrap();

        let mut user = store
            .find_user_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        user.is_active = false;
        store.save_user(&user).await.unwrap();

        match auth.login(login_cmd("ada@example.com", "password123")).await {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, ACCOUNT_DEACTIVATED),
            other => panic!("unexpected {:?}", other.map(|s| s.user.email)),
        }
    }

    #[actix_rt::test]
    async fn test_refresh_token_is_single_use() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        let session = auth.signup(signup_cmd("ada@example.com")).await.unwrap();
        let first = session.tokens.refresh_token;

        let rotated = auth.refresh(&first).await.unwrap();
        assert_ne!(rotated.tokens.refresh_token, first);
        assert!(matches!(
            auth.refresh(&first).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(auth.refresh(&rotated.tokens.refresh_token).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_profile_write_keeps_rotated_sessions() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        let session = auth.signup(signup_cmd("ada@example.com")).await.unwrap();
        let first = session.tokens.refresh_token;

        let mut stale = store
            .find_user_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        let rotated = auth.refresh(&first).await.unwrap();

        stale.name = "Ada King".into();
        store.save_user(&stale).await.unwrap();

        let user = store.find_user(&stale.object_id()).await.unwrap().unwrap();
        assert_eq!(user.name, "Ada King");
        assert!(matches!(
            auth.refresh(&first).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(auth.refresh(&rotated.tokens.refresh_token).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_logout_is_idempotent() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        let session = auth.signup(signup_cmd("ada@example.com")).await.unwrap();
        let user_id = ObjectId::parse_str(&session.user.id).unwrap();

        auth.logout(&user_id, &session.tokens.refresh_token)
            .await
            .unwrap();
        auth.logout(&user_id, &session.tokens.refresh_token)
            .await
            .unwrap();
        assert!(auth.refresh(&session.tokens.refresh_token).await.is_err());
    }

    #[actix_rt::test]
    async fn test_password_reset_flow() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        let session = auth.signup(signup_cmd("ada@example.com")).await.unwrap();

        assert!(auth
            .forgot_password("nobody@example.com", "http://localhost")
            .await
            .unwrap()
            .is_none());
        let raw = auth
            .forgot_password("ada@example.com", "http://localhost")
            .await
            .unwrap()
            .unwrap();

        auth.reset_password(ResetPassword {
            token: raw.clone(),
            password: "new-password-1".into(),
        })
        .await
        .unwrap();

        // Old sessions are revoked and the token cannot be replayed.
        assert!(auth.refresh(&session.tokens.refresh_token).await.is_err());
        match auth
            .reset_password(ResetPassword {
                token: raw,
                password: "another-pass".into(),
            })
            .await
        {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, INVALID_RESET_TOKEN),
            other => panic!("unexpected {:?}", other),
        }

        assert!(auth
            .login(login_cmd("ada@example.com", "new-password-1"))
            .await
            .is_ok());
    }

    #[actix_rt::test]
    async fn test_expired_reset_token_rejected() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        auth.signup(signup_cmd("ada@example.com")).await.unwrap();
        let raw = auth
            .forgot_password("ada@example.com", "http://localhost")
            .await
            .unwrap()
            .unwrap();

        let mut user = store
            .find_user_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        user.password_reset_expires = Some(Utc::now().timestamp() - 1);
        store.save_user(&user).await.unwrap();

        assert!(matches!(
            auth.reset_password(ResetPassword {
                token: raw,
                password: "new-password-1".into(),
            })
            .await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_rt::test]
    async fn test_signup_blocked_when_registrations_disabled() {
        let (store, tokens) = setup();
        store
            .save_settings(&Settings {
                allow_registrations: false,
                ..Settings::default()
            })
            .await
            .unwrap();
        let auth = AuthService::new(&store, &tokens, 4);
        assert!(matches!(
            auth.signup(signup_cmd("ada@example.com")).await,
            Err(AppError::ServiceUnavailable(_))
        ));
    }

    #[actix_rt::test]
    async fn test_maintenance_blocks_non_admin_login() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        auth.signup(signup_cmd("ada@example.com")).await.unwrap();
        auth.bootstrap_admin(&AdminBootstrap {
            email: "root@example.com".into(),
            password: "admin-password".into(),
            name: "Root".into(),
        })
        .await
        .unwrap();
        store
            .save_settings(&Settings {
                maintenance_mode: true,
                ..Settings::default()
            })
            .await
            .unwrap();

        assert!(matches!(
            auth.login(login_cmd("ada@example.com", "password123")).await,
            Err(AppError::ServiceUnavailable(_))
        ));
        let admin = auth
            .login(login_cmd("root@example.com", "admin-password"))
            .await
            .unwrap();
        assert_eq!(admin.user.role, UserRole::SuperAdmin);
    }

    #[actix_rt::test]
    async fn test_bootstrap_admin_runs_once() {
        let (store, tokens) = setup();
        let auth = AuthService::new(&store, &tokens, 4);
        let admin = AdminBootstrap {
            email: "Root@Example.com".into(),
            password: "admin-password".into(),
            name: "Root".into(),
        };
        assert!(auth.bootstrap_admin(&admin).await.unwrap());
        assert!(!auth.bootstrap_admin(&admin).await.unwrap());
    }
}
