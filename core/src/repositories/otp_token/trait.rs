//! Token store trait defining the persistence contract for one-time codes.
//!
//! The only concurrency-control primitive of the whole system lives here:
//! [`OtpTokenRepository::try_consume`] must evaluate the eligibility
//! predicate and flip `consumed` in one indivisible step. Every backend
//! (in-memory, MySQL, Redis) provides that guarantee its own way.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::OtpToken;
use crate::domain::value_objects::{Purpose, UserId};
use crate::errors::OtpResult;

/// Repository trait for one-time code persistence
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use chrono::{DateTime, Utc};
/// use uuid::Uuid;
/// use otp_core::domain::{OtpToken, Purpose, UserId};
/// use otp_core::errors::OtpResult;
/// use otp_core::repositories::OtpTokenRepository;
///
/// struct PostgresOtpTokenRepository {
///     // connection pool
/// }
///
/// #[async_trait]
/// impl OtpTokenRepository for PostgresOtpTokenRepository {
///     async fn create(&self, token: OtpToken) -> OtpResult<OtpToken> {
///         Ok(token)
///     }
///
///     async fn try_consume(
///         &self,
///         user_id: UserId,
///         code: &str,
///         purpose: &Purpose,
///         now: DateTime<Utc>,
///     ) -> OtpResult<bool> {
///         // One conditional UPDATE, never SELECT followed by UPDATE
///         Ok(false)
///     }
///
///     async fn find_by_id(&self, id: Uuid) -> OtpResult<Option<OtpToken>> {
///         Ok(None)
///     }
///
///     async fn delete_expired(&self, cutoff: DateTime<Utc>) -> OtpResult<u64> {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait OtpTokenRepository: Send + Sync {
    /// Persist a freshly issued token
    ///
    /// # Returns
    /// * `Ok(OtpToken)` - The stored token
    /// * `Err(OtpError::Storage)` - The store is unavailable
    async fn create(&self, token: OtpToken) -> OtpResult<OtpToken>;

    /// Atomically consume one eligible token matching the tuple
    ///
    /// Eligible means `consumed = false`, `now < expires_at` and an exact
    /// match on `(user_id, code, purpose)`. At most one record is flipped.
    ///
    /// # Returns
    /// * `Ok(true)` - This call consumed a token
    /// * `Ok(false)` - No eligible token (unknown, expired and already
    ///   consumed are not distinguished)
    /// * `Err(OtpError::Storage)` - Outcome unknown; implementations must
    ///   not retry internally
    async fn try_consume(
        &self,
        user_id: UserId,
        code: &str,
        purpose: &Purpose,
        now: DateTime<Utc>,
    ) -> OtpResult<bool>;

    /// Find a token by its identifier
    async fn find_by_id(&self, id: Uuid) -> OtpResult<Option<OtpToken>>;

    /// Delete tokens whose `expires_at` is at or before `cutoff`
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of records removed
    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> OtpResult<u64>;
}
