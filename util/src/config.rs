//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Credentials (database location, JWT secret, API base URL) are only ever read
//! from the environment or a local `.env` file.

use std::env;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub api_url: String,
    pub api_timeout_secs: u64,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub poll_interval_secs: u64,
    pub allow_mock_writes: bool,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing or unparsable values fall back to development defaults. The
    /// JWT secret has no default; an empty secret is rejected when a session
    /// is issued.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        // Legacy key, still accepted for existing .env files.
        let api_url = env::var("API_URL")
            .or_else(|_| env::var("VITE_API_URL"))
            .unwrap_or_else(|_| "http://127.0.0.1:3000".into());

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "repair-desk".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: flag("LOG_TO_STDOUT"),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/repair-desk.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parse_or("PORT", 3000),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_timeout_secs: parse_or("API_TIMEOUT_SECS", 10),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            jwt_duration_minutes: parse_or("JWT_DURATION_MINUTES", 60),
            poll_interval_secs: parse_or("POLL_INTERVAL_SECS", 30),
            allow_mock_writes: flag("ALLOW_MOCK_WRITES"),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_api_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.api_url = value.into());
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: u64) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value);
    }

    pub fn set_poll_interval_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.poll_interval_secs = value);
    }

    pub fn set_allow_mock_writes(value: bool) {
        AppConfig::set_field(|cfg| cfg.allow_mock_writes = value);
    }
}

// --- Free accessors, mirroring the fields ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn api_url() -> String {
    AppConfig::global().api_url.clone()
}

pub fn api_timeout_secs() -> u64 {
    AppConfig::global().api_timeout_secs
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn poll_interval_secs() -> u64 {
    AppConfig::global().poll_interval_secs
}

pub fn allow_mock_writes() -> bool {
    AppConfig::global().allow_mock_writes
}
