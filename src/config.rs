//! Application configuration loaded from environment variables.

use std::env;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DATABASE_NAME: &str = "globetrotter";
const CLIENT_URL: &str = "http://localhost:5173";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

/// Credentials for the superadmin account created at startup when absent.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub mongo_uri: Option<String>,
    pub database_name: String,
    pub client_url: String,

    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub bcrypt_cost: u32,

    pub admin: Option<AdminBootstrap>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            storage: StorageBackend::Memory,
            mongo_uri: None,
            database_name: DATABASE_NAME.to_string(),
            client_url: CLIENT_URL.to_string(),
            jwt_secret: "test_access_secret_32_bytes_min!".to_string(),
            jwt_refresh_secret: "test_refresh_secret_32_bytes_mn!".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            bcrypt_cost: 4,
            admin: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if cfg!(debug_assertions) {
            dotenv::dotenv().ok();
        }

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "mongo".to_string())
            .to_lowercase()
            .as_str()
        {
            "mongo" | "mongodb" => StorageBackend::Mongo,
            "memory" => StorageBackend::Memory,
            other => return Err(ConfigError::Invalid("STORAGE_BACKEND", other.to_string())),
        };

        let mongo_uri = env::var("MONGODB_URI").ok();
        if storage == StorageBackend::Mongo && mongo_uri.is_none() {
            return Err(ConfigError::Missing("MONGODB_URI"));
        }

        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminBootstrap {
                email,
                password,
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| HOST.to_string()),
            port: parse_or("PORT", PORT)?,
            storage,
            mongo_uri,
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| DATABASE_NAME.to_string()),
            client_url: env::var("CLIENT_URL").unwrap_or_else(|_| CLIENT_URL.to_string()),
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_refresh_secret: env::var("JWT_REFRESH_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_REFRESH_SECRET"))?,
            access_token_ttl_minutes: parse_or("ACCESS_TOKEN_TTL_MINUTES", 15)?,
            refresh_token_ttl_days: parse_or("REFRESH_TOKEN_TTL_DAYS", 7)?,
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            admin,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
