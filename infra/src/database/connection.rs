//! MySQL pool holding the `otp_tokens` table
//!
//! Statements are logged at debug; those slower than
//! `slow_query_threshold` are logged at warn.

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{ConnectOptions, MySqlPool};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::log::LevelFilter;

use otp_shared::config::DatabaseConfig;

use crate::InfrastructureError;

/// Shared MySQL pool plus the settings it was opened with
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
    config: DatabaseConfig,
}

impl DatabasePool {
    /// Open the pool and verify one connection
    ///
    /// # Example
    /// ```no_run
    /// use otp_infra::database::DatabasePool;
    /// use otp_shared::config::DatabaseConfig;
    ///
    /// async fn open() -> Result<DatabasePool, otp_infra::InfrastructureError> {
    ///     let pool = DatabasePool::new(DatabaseConfig::new("mysql://otp@localhost/otp")).await?;
    ///     pool.run_migrations().await?;
    ///     Ok(pool)
    /// }
    /// ```
    pub async fn new(config: DatabaseConfig) -> Result<Self, InfrastructureError> {
        let connect_options = connect_options(&config)?;

        tracing::info!(
            max_connections = config.max_connections,
            "Opening MySQL connection pool"
        );

        let pool = pool_options(&config)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to open MySQL connection pool");
                InfrastructureError::Database(e)
            })?;

        Ok(Self { pool, config })
    }

    /// Underlying SQLx pool, for repositories
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Round trip `SELECT 1`
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "MySQL health check failed");
                InfrastructureError::Database(e)
            })?;

        tracing::debug!(healthy = value == 1, "MySQL health check");
        Ok(value == 1)
    }

    pub fn statistics(&self) -> PoolStatistics {
        PoolStatistics {
            connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
        }
    }

    /// Wait for checked-out connections and close the pool
    pub async fn close(&self) {
        tracing::info!(stats = %self.statistics(), "Closing MySQL connection pool");
        self.pool.close().await;
    }

    /// Apply the embedded migrations from `infra/migrations`
    ///
    /// Already applied migrations are skipped.
    pub async fn run_migrations(&self) -> Result<(), InfrastructureError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "MySQL migration failed");
                InfrastructureError::Migration(e)
            })?;

        tracing::info!("MySQL schema is up to date");
        Ok(())
    }
}

pub(crate) fn connect_options(
    config: &DatabaseConfig,
) -> Result<MySqlConnectOptions, InfrastructureError> {
    let options = MySqlConnectOptions::from_str(&config.url)
        .map_err(|e| InfrastructureError::Config(format!("Invalid database URL: {}", e)))?;

    Ok(options
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(
            LevelFilter::Warn,
            Duration::from_millis(config.slow_query_threshold),
        ))
}

fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .max_lifetime(Duration::from_secs(config.max_lifetime))
        .test_before_acquire(true)
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatistics {
    pub connections: u32,
    pub idle_connections: usize,
    pub max_connections: u32,
}

impl PoolStatistics {
    /// Connections currently checked out
    pub fn in_use(&self) -> u32 {
        self.connections
            .saturating_sub(u32::try_from(self.idle_connections).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for PoolStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} connections, {} in use",
            self.connections,
            self.max_connections,
            self.in_use()
        )
    }
}
