//! Periodic removal of expired token records
//!
//! Housekeeping only: an expired token is already unredeemable whether or
//! not its record still exists.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use otp_shared::config::CleanupConfig;

use crate::clock::{Clock, SystemClock};
use crate::errors::{OtpError, OtpResult};
use crate::repositories::OtpTokenRepository;

/// Service deleting tokens that expired longer than the retention ago
pub struct OtpCleanupService<R: OtpTokenRepository + ?Sized + 'static> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    config: CleanupConfig,
}

impl<R: OtpTokenRepository + ?Sized + 'static> OtpCleanupService<R> {
    /// Create a new cleanup service
    pub fn new(repository: Arc<R>, config: CleanupConfig) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run a single cleanup cycle
    ///
    /// # Returns
    /// * `Ok(CleanupResult)` - Summary; `cutoff` is `None` when disabled
    /// * `Err(OtpError)` - If the store rejected the delete
    pub async fn run_cleanup(&self) -> OtpResult<CleanupResult> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let retention = self.config.retention_seconds;
        let cutoff = Duration::try_seconds(retention)
            .and_then(|retention| self.clock.now().checked_sub_signed(retention))
            .ok_or_else(|| {
                OtpError::configuration(format!("retention_seconds {} is out of range", retention))
            })?;
        let deleted = self.repository.delete_expired(cutoff).await?;

        info!(
            deleted = deleted,
            cutoff = %cutoff,
            event = "otp_cleanup",
            "Deleted expired one-time code records"
        );

        Ok(CleanupResult {
            expired_tokens_deleted: deleted,
            cutoff: Some(cutoff),
        })
    }

    /// Start the cleanup service as a background task
    ///
    /// Returns `None` without spawning when cleanup is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("One-time code cleanup is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                "One-time code cleanup started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_cleanup().await {
                    error!("One-time code cleanup cycle failed: {}", e);
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupResult {
    /// Number of token records deleted
    pub expired_tokens_deleted: u64,
    /// Tokens expiring at or before this instant were eligible for deletion
    pub cutoff: Option<DateTime<Utc>>,
}

impl CleanupResult {
    /// Whether the cycle actually ran
    pub fn ran(&self) -> bool {
        self.cutoff.is_some()
    }
}
