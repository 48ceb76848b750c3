//! Main one-time code service implementation

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::domain::entities::OtpToken;
use crate::domain::value_objects::{Purpose, UserId};
use crate::errors::{OtpError, OtpResult};
use crate::repositories::OtpTokenRepository;
use crate::services::code_generator::{self, CodeGenerator};
use crate::services::purpose::PurposeRegistry;

use super::config::OtpServiceConfig;
use super::types::IssuedOtp;

/// Issues codes and redeems them at most once
///
/// Holds no lock of its own: the store's atomic consume is the only
/// concurrency control, so one instance can be shared across tasks and
/// several processes can share one store.
pub struct OtpService<R: OtpTokenRepository + ?Sized> {
    /// Token store
    repository: Arc<R>,
    /// Known purposes and their side effects
    registry: Arc<PurposeRegistry>,
    /// Source of codes
    generator: Arc<dyn CodeGenerator>,
    /// Source of the current time
    clock: Arc<dyn Clock>,
    /// Code policy
    config: OtpServiceConfig,
}

impl<R: OtpTokenRepository + ?Sized> OtpService<R> {
    /// Create a new service using the system clock and the configured generator
    ///
    /// # Arguments
    ///
    /// * `repository` - Token store implementation
    /// * `registry` - Purposes that may be issued and redeemed
    /// * `config` - Validated code policy
    pub fn new(
        repository: Arc<R>,
        registry: Arc<PurposeRegistry>,
        config: OtpServiceConfig,
    ) -> Self {
        let generator: Arc<dyn CodeGenerator> =
            Arc::from(code_generator::from_config(config.code_alphabet, config.code_length));

        Self {
            repository,
            registry,
            generator,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the code generator
    pub fn with_code_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &OtpServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &PurposeRegistry {
        &self.registry
    }

    /// Issue a new code for a user and purpose
    ///
    /// Older outstanding codes for the same user and purpose stay valid.
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedOtp)` - The code and its expiry, for delivery by the caller
    /// * `Err(OtpError::UnknownPurpose)` - No handler is registered for `purpose`
    /// * `Err(OtpError::Storage)` - The token could not be persisted
    pub async fn issue(&self, user_id: UserId, purpose: &Purpose) -> OtpResult<IssuedOtp> {
        if let Err(e) = self.registry.require(purpose) {
            tracing::warn!(
                user_id = %user_id,
                purpose = %purpose,
                event = "otp_unknown_purpose",
                "Refusing to issue code for unregistered purpose"
            );
            return Err(e);
        }

        let now = self.clock.now();
        let code = self.generator.generate();
        let token = OtpToken::issue(user_id, code, purpose.clone(), now, self.config.ttl)?;

        let token = self.repository.create(token).await.map_err(|e| {
            tracing::error!(
                user_id = %user_id,
                purpose = %purpose,
                error = %e,
                event = "otp_storage_failed",
                "Failed to store issued code"
            );
            e
        })?;

        tracing::info!(
            user_id = %user_id,
            purpose = %purpose,
            token_id = %token.id,
            expires_at = %token.expires_at,
            event = "otp_issued",
            "Issued one-time code"
        );

        Ok(IssuedOtp {
            token_id: token.id,
            code: token.code,
            expires_at: token.expires_at,
        })
    }

    /// Redeem a code, applying the purpose's side effect on success
    ///
    /// Wrong, unknown, expired and already used codes all yield `Ok(false)`
    /// and never run the side effect.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - This call consumed the token and the side effect ran
    /// * `Ok(false)` - Nothing was consumed
    /// * `Err(OtpError::Storage)` - Outcome unknown; a retry that returns
    ///   `false` may mean an earlier attempt already succeeded
    /// * `Err(OtpError::SideEffect)` - The token is consumed but the effect
    ///   failed and needs reconciliation
    pub async fn redeem(&self, user_id: UserId, code: &str, purpose: &Purpose) -> OtpResult<bool> {
        let Some(handler) = self.registry.side_effect_for(purpose) else {
            tracing::warn!(
                user_id = %user_id,
                purpose = %purpose,
                event = "otp_unknown_purpose",
                "Redeem attempted for unregistered purpose"
            );
            return Ok(false);
        };

        let now = self.clock.now();
        let consumed = self
            .repository
            .try_consume(user_id, code, purpose, now)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %user_id,
                    purpose = %purpose,
                    error = %e,
                    event = "otp_storage_failed",
                    "Consume failed, redemption outcome unknown"
                );
                e
            })?;

        if !consumed {
            tracing::info!(
                user_id = %user_id,
                purpose = %purpose,
                event = "otp_rejected",
                "No eligible code matched"
            );
            return Ok(false);
        }

        if let Err(source) = handler.on_redeemed(user_id).await {
            tracing::error!(
                user_id = %user_id,
                purpose = %purpose,
                error = %source,
                event = "otp_side_effect_failed",
                "Code consumed but side effect failed"
            );
            return Err(OtpError::SideEffect {
                purpose: purpose.clone(),
                user_id,
                source,
            });
        }

        tracing::info!(
            user_id = %user_id,
            purpose = %purpose,
            event = "otp_redeemed",
            "Redeemed one-time code"
        );

        Ok(true)
    }
}
