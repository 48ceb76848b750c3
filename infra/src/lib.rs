//! # Infrastructure Layer
//!
//! Concrete token stores and wiring for the one-time code services.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Database**: MySQL token store and identity repository using SQLx
//! - **Cache**: Redis token store driven by server-side scripts
//! - **Settings**: layered configuration loading
//! - **Telemetry**: tracing subscriber setup
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis support (default)

use std::sync::Arc;

use otp_core::domain::Purpose;
use otp_core::errors::OtpError;
use otp_core::repositories::{
    InMemoryOtpTokenRepository, InMemoryUserRepository, OtpTokenRepository, UserRepository,
};
use otp_core::services::{
    AcknowledgeHandler, EmailVerificationHandler, OtpCleanupService, OtpService, OtpServiceConfig,
    PurposeRegistry,
};
use otp_shared::config::{AppConfig, StorageBackend};

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis client and token store
#[cfg(feature = "redis-cache")]
pub mod cache;

pub mod settings;
pub mod telemetry;

pub use settings::load_config;
pub use telemetry::init_tracing;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Redis error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<config::ConfigError> for InfrastructureError {
    fn from(e: config::ConfigError) -> Self {
        InfrastructureError::Config(e.to_string())
    }
}

impl From<InfrastructureError> for OtpError {
    fn from(e: InfrastructureError) -> Self {
        OtpError::storage(e)
    }
}

/// Stores and collaborators built from configuration
#[derive(Clone)]
pub struct InfrastructureServices {
    /// Token store selected by `storage.backend`
    pub otp_tokens: Arc<dyn OtpTokenRepository>,
    /// Identity store, when one is reachable for the selected backend
    pub users: Option<Arc<dyn UserRepository>>,
    /// MySQL pool, for the `mysql` backend
    #[cfg(feature = "mysql")]
    pub database: Option<database::DatabasePool>,
    /// Redis client, for the `redis` backend
    #[cfg(feature = "redis-cache")]
    pub redis: Option<cache::RedisClient>,
    config: AppConfig,
}

impl InfrastructureServices {
    /// Connect the configured backend
    ///
    /// This function sets up:
    /// - Database connection pool and migrations (`mysql`)
    /// - Redis connection (`redis`)
    /// - Process-local stores (`memory`)
    pub async fn initialize(config: &AppConfig) -> Result<Self, InfrastructureError> {
        tracing::info!(
            environment = %config.environment,
            backend = %config.storage.backend,
            "Initializing infrastructure services..."
        );

        config.validate().map_err(InfrastructureError::Config)?;
        OtpServiceConfig::from_config(&config.otp)
            .map_err(|e| InfrastructureError::Config(e.to_string()))?;

        let services = match config.storage.backend {
            StorageBackend::Memory => Self {
                otp_tokens: Arc::new(InMemoryOtpTokenRepository::new()),
                users: Some(Arc::new(InMemoryUserRepository::new())),
                #[cfg(feature = "mysql")]
                database: None,
                #[cfg(feature = "redis-cache")]
                redis: None,
                config: config.clone(),
            },
            StorageBackend::MySql => Self::initialize_mysql(config).await?,
            StorageBackend::Redis => Self::initialize_redis(config).await?,
        };

        tracing::info!("Infrastructure services initialized successfully");

        Ok(services)
    }

    #[cfg(feature = "mysql")]
    async fn initialize_mysql(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let pool = database::DatabasePool::new(config.database.clone()).await?;
        if config.storage.run_migrations {
            pool.run_migrations().await?;
        }

        Ok(Self {
            otp_tokens: Arc::new(database::MySqlOtpTokenRepository::new(pool.pool().clone())),
            users: Some(Arc::new(database::MySqlUserRepository::new(pool.pool().clone()))),
            database: Some(pool),
            #[cfg(feature = "redis-cache")]
            redis: None,
            config: config.clone(),
        })
    }

    #[cfg(not(feature = "mysql"))]
    async fn initialize_mysql(_config: &AppConfig) -> Result<Self, InfrastructureError> {
        Err(InfrastructureError::Config(
            "storage backend 'mysql' requires the `mysql` feature".to_string(),
        ))
    }

    #[cfg(feature = "redis-cache")]
    async fn initialize_redis(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let client = cache::RedisClient::new(config.cache.clone()).await?;
        let store = cache::RedisOtpTokenStore::new(client.clone());

        Ok(Self {
            otp_tokens: Arc::new(store),
            users: None,
            #[cfg(feature = "mysql")]
            database: None,
            redis: Some(client),
            config: config.clone(),
        })
    }

    #[cfg(not(feature = "redis-cache"))]
    async fn initialize_redis(_config: &AppConfig) -> Result<Self, InfrastructureError> {
        Err(InfrastructureError::Config(
            "storage backend 'redis' requires the `redis-cache` feature".to_string(),
        ))
    }

    /// Configuration the services were built from
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry with the built-in purposes
    ///
    /// `email_verification` is only registered when an identity store is
    /// available; `password_reset` always is.
    pub fn standard_registry(&self) -> PurposeRegistry {
        let mut registry = PurposeRegistry::new().register(
            Purpose::PASSWORD_RESET,
            Arc::new(AcknowledgeHandler::new(Purpose::PASSWORD_RESET)),
        );

        match &self.users {
            Some(users) => {
                registry.insert(
                    Purpose::EMAIL_VERIFICATION,
                    Arc::new(EmailVerificationHandler::new(Arc::clone(users))),
                );
            }
            None => tracing::warn!(
                purpose = %Purpose::EMAIL_VERIFICATION,
                "No identity store configured, purpose not registered"
            ),
        }

        registry
    }

    /// Assemble the code service over the configured store
    pub fn otp_service(
        &self,
        registry: PurposeRegistry,
    ) -> Result<OtpService<dyn OtpTokenRepository>, InfrastructureError> {
        let service_config = OtpServiceConfig::from_config(&self.config.otp)
            .map_err(|e| InfrastructureError::Config(e.to_string()))?;

        Ok(OtpService::new(
            Arc::clone(&self.otp_tokens),
            Arc::new(registry),
            service_config,
        ))
    }

    /// Housekeeping service over the configured store
    pub fn cleanup_service(&self) -> OtpCleanupService<dyn OtpTokenRepository> {
        OtpCleanupService::new(Arc::clone(&self.otp_tokens), self.config.cleanup.clone())
    }

    /// Check connectivity of the configured backend
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        #[cfg(feature = "mysql")]
        if let Some(pool) = &self.database {
            return pool.health_check().await;
        }

        #[cfg(feature = "redis-cache")]
        if let Some(client) = &self.redis {
            return client.health_check().await;
        }

        Ok(true)
    }

    /// Release pooled connections
    pub async fn shutdown(&self) {
        #[cfg(feature = "mysql")]
        if let Some(pool) = &self.database {
            pool.close().await;
        }
    }
}
