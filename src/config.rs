//! Application configuration loaded from environment variables.

use std::time::Duration;

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::records::AttainmentPolicy;

/// Which persistence collaborator to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL via `DATABASE_URL`.
    Postgres,
    /// In-process map, lost on exit.
    Memory,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Comma-separated allowed CORS origins; unset or `*` allows any.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    // === Persistence ===
    /// Store backend.
    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,

    /// Connection string for the postgres backend.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub db_acquire_timeout_secs: u64,

    // === Attainment Policy ===
    /// Average marks must exceed this for the upper level.
    #[serde(default = "default_threshold")]
    pub attainment_threshold: f64,

    /// Level above the threshold.
    #[serde(default = "default_upper_level")]
    pub attainment_upper_level: u8,

    /// Level at or below the threshold.
    #[serde(default = "default_level")]
    pub attainment_default_level: u8,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_port() -> u16 {
    5000
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Postgres
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_threshold() -> f64 {
    50.0
}

fn default_upper_level() -> u8 {
    3
}

fn default_level() -> u8 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.store_backend == StoreBackend::Postgres
            && self.database_url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err("DATABASE_URL is required when STORE_BACKEND=postgres".to_string());
        }

        if self.db_max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        if !self.attainment_threshold.is_finite() || self.attainment_threshold < 0.0 {
            return Err("ATTAINMENT_THRESHOLD must be a non-negative number".to_string());
        }

        if self.attainment_upper_level <= self.attainment_default_level {
            return Err(
                "ATTAINMENT_UPPER_LEVEL must be greater than ATTAINMENT_DEFAULT_LEVEL".to_string(),
            );
        }

        Ok(())
    }

    /// Attainment policy from the configured threshold and levels.
    pub fn attainment_policy(&self) -> AttainmentPolicy {
        AttainmentPolicy {
            threshold: self.attainment_threshold,
            upper_level: self.attainment_upper_level,
            default_level: self.attainment_default_level,
        }
    }

    /// Pool acquire timeout.
    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    /// Explicit CORS origins, or `None` when any origin is allowed.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let raw = self.cors_allowed_origins.as_deref()?.trim();
        if raw.is_empty() || raw == "*" {
            return None;
        }

        Some(
            raw.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        )
    }
}
