use anyhow::{Context, Result};
use docvault_auth::PasswordPolicy;
use docvault_cache::CacheConfig;
use docvault_database::DatabaseConfig;
use docvault_documents::DEFAULT_MAX_UPLOAD_BYTES;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub refresh_token_expiration_days: i64,
    pub password_policy: PasswordPolicy,
    pub storage_path: String,
    pub max_upload_bytes: usize,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env_or("SERVER_PORT", 3000)?,
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            jwt_secret,
            jwt_expiration_hours: env_or("JWT_EXPIRATION_HOURS", 1)?,
            refresh_token_expiration_days: env_or("REFRESH_TOKEN_EXPIRATION_DAYS", 30)?,
            password_policy: password_policy_from_env()?,
            storage_path: std::env::var("STORAGE_PATH")
                .unwrap_or_else(|_| "./data/storage".to_string()),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            run_migrations: env_or("RUN_MIGRATIONS", true)?,
        })
    }

    /// Request body limit for uploads: base64 overhead plus room for the JSON envelope
    pub fn upload_body_limit(&self) -> usize {
        self.max_upload_bytes / 3 * 4 + 64 * 1024
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
            refresh_token_expiration_days: 30,
            password_policy: PasswordPolicy::default(),
            storage_path: std::env::temp_dir()
                .join("docvault-api-test")
                .to_string_lossy()
                .into_owned(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            run_migrations: false,
        }
    }
}

fn password_policy_from_env() -> Result<PasswordPolicy> {
    let defaults = PasswordPolicy::default();
    let policy = PasswordPolicy {
        min_length: env_or("PASSWORD_MIN_LENGTH", defaults.min_length)?,
        require_mixed_case: env_or("PASSWORD_REQUIRE_MIXED_CASE", defaults.require_mixed_case)?,
        require_digit: env_or("PASSWORD_REQUIRE_DIGIT", defaults.require_digit)?,
    };
    if policy.min_length == 0 {
        anyhow::bail!("PASSWORD_MIN_LENGTH must be at least 1");
    }
    Ok(policy)
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => parse_value(key, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: {:?}", key, value))
}
