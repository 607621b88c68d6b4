//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behavior configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger behavior configuration.
///
/// Controls the bounded retry loop used when the store reports a
/// serialization conflict between concurrent ledger operations.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Maximum attempts for a conflicting store transaction.
    #[serde(default = "default_max_conflict_attempts")]
    pub max_conflict_attempts: u32,
    /// Base backoff between conflict retries, in milliseconds.
    #[serde(default = "default_conflict_backoff_ms")]
    pub conflict_backoff_ms: u64,
}

fn default_max_conflict_attempts() -> u32 {
    3
}

fn default_conflict_backoff_ms() -> u64 {
    50
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_conflict_attempts: default_max_conflict_attempts(),
            conflict_backoff_ms: default_conflict_backoff_ms(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SCRIP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
