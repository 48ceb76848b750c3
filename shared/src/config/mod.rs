//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `otp` - Code policy and housekeeping configuration
//! - `storage` - Token store backend selection
//! - `database` - MySQL connection and pool configuration
//! - `cache` - Redis configuration for the Redis token store
//! - `environment` - Deployment environment and the files it selects
//! - `logging` - Subscriber level and output format

pub mod cache;
pub mod database;
pub mod environment;
pub mod logging;
pub mod otp;
pub mod storage;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::Environment;
pub use logging::{LogFormat, LoggingConfig};
pub use otp::{CleanupConfig, CodeAlphabet, OtpConfig};
pub use storage::{StorageBackend, StorageConfig};

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Code policy configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Token store selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Redis configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Expired token housekeeping
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl AppConfig {
    /// Create configuration defaults for an environment
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::development();
                config.environment = Environment::Staging;
                config.storage.backend = StorageBackend::MySql;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }

    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            otp: OtpConfig::default(),
            storage: StorageConfig::default(),
            database: DatabaseConfig::new("mysql://localhost:3306/otp_dev"),
            cache: CacheConfig::default(),
            cleanup: CleanupConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            otp: OtpConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::MySql,
                run_migrations: false,
            },
            database: DatabaseConfig::new("mysql://prod-db:3306/otp").with_max_connections(50),
            cache: CacheConfig::default(),
            cleanup: CleanupConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Check every section holding values the services compute with
    ///
    /// The error names the offending section.
    pub fn validate(&self) -> Result<(), String> {
        self.otp.validate().map_err(|e| format!("otp: {}", e))?;
        self.cleanup.validate().map_err(|e| format!("cleanup: {}", e))?;
        self.cache.validate().map_err(|e| format!("cache: {}", e))
    }
}
