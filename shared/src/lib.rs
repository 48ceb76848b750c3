//! Shared configuration types for the one-time code services
//!
//! This crate provides the configuration model used across all server modules:
//! - Code policy (TTL, length, alphabet)
//! - Storage backend selection
//! - Database and Redis connection settings
//! - Housekeeping and logging configuration

pub mod config;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, CleanupConfig, CodeAlphabet, DatabaseConfig, Environment, LogFormat,
    LoggingConfig, OtpConfig, StorageBackend, StorageConfig,
};
