use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::auth::{Claims, TokenType};
use crate::models::user::{RefreshToken, User};

pub const RESET_TOKEN_BYTES: usize = 32;
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Claims carried by a refresh token. `jti` makes every issued token
/// distinct even within the same second.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Signs and verifies access and refresh tokens with separate secrets.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days),
        }
    }

    pub fn issue_access(&self, user: &User, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: user.object_id().to_hex(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp() as usize,
            exp: (now + self.access_ttl).timestamp() as usize,
            token_type: TokenType::Access,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.access_encoding,
        )?)
    }

    pub fn issue_refresh(
        &self,
        user_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> Result<RefreshToken, AppError> {
        let expires_at = now + self.refresh_ttl;
        let claims = RefreshClaims {
            sub: user_id.to_hex(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Refresh,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.refresh_encoding,
        )?;
        Ok(RefreshToken {
            token,
            expires_at: expires_at.timestamp(),
        })
    }

    /// Issues both tokens. The caller must persist the returned
    /// [`RefreshToken`] before handing the pair out.
    pub fn issue_pair(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<(TokenPair, RefreshToken), AppError> {
        let access_token = self.issue_access(user, now)?;
        let refresh = self.issue_refresh(&user.object_id(), now)?;
        Ok((
            TokenPair {
                access_token,
                refresh_token: refresh.token.clone(),
                expires_in: self.access_ttl.num_seconds(),
            },
            refresh,
        ))
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.access_decoding, &validation())
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        if data.claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Invalid token type".to_string()));
        }
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
            .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;
        if data.claims.token_type != TokenType::Refresh {
            return Err(AppError::Unauthorized("Invalid token type".to_string()));
        }
        Ok(data.claims)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 5;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);
    validation
}

/// Returns the raw reset token (sent to the user) and its SHA-256 hex
/// digest (stored).
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);
    let hash = hash_reset_token(&raw);
    (raw, hash)
}

pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
