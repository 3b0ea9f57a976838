//! # gaze-config
//!
//! Layered configuration loading for gazelog using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GAZE_*` prefix, `__` as separator)
//! 2. Bare deployment variables: `DATABASE_URL`, `DATABASE_AUTH_TOKEN`, `PORT`
//! 3. Project-level `gazelog.toml`
//! 4. User-level `~/.config/gazelog/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `GAZE_DATABASE__URL` -> `database.url`,
//! `GAZE_SERVER__STATIC_DIR` -> `server.static_dir`, etc.
//! Platform-injected `DATABASE_URL` and `PORT` are honored as-is so the
//! service runs unmodified on hosts that only provide those.
//!
//! # Usage
//!
//! ```no_run
//! use gaze_config::GazeConfig;
//!
//! let config = GazeConfig::load_with_dotenv().expect("config");
//!
//! if config.database.is_configured() {
//!     println!("persisting to {}", config.database.url);
//! }
//! ```

mod database;
mod error;
mod server;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "gazelog.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GazeConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl GazeConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Bare platform variables
        figment = figment.merge(
            Env::raw()
                .only(&["DATABASE_URL", "DATABASE_AUTH_TOKEN", "PORT"])
                .map(|key| {
                    if key == "database_url" {
                        "database.url".into()
                    } else if key == "database_auth_token" {
                        "database.auth_token".into()
                    } else {
                        "server.port".into()
                    }
                }),
        );

        // Layer 4: Prefixed variables (highest priority)
        figment.merge(Env::prefixed("GAZE_").split("__"))
    }

    /// Reject values that would make the service unusable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| {
            Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };

        if self.database.max_connections == 0 {
            return invalid("database.max_connections", "must be at least 1");
        }
        if self.database.acquire_timeout_secs == 0 {
            return invalid("database.acquire_timeout_secs", "must be positive");
        }
        if self.database.statement_timeout_secs == 0 {
            return invalid("database.statement_timeout_secs", "must be positive");
        }
        if self.server.body_limit_bytes == 0 {
            return invalid("server.body_limit_bytes", "must be positive");
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gazelog").join("config.toml"))
    }
}
