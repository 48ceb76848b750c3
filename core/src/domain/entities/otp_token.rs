//! One-time code token entity.

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Purpose, UserId};
use crate::errors::{OtpError, OtpResult};

/// Lifecycle state of a token at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    /// Redeemable until `expires_at`
    Active,
    /// Successfully redeemed (terminal)
    Consumed,
    /// Past `expires_at` without being redeemed (terminal)
    Expired,
}

/// A single issued code bound to a user and a purpose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpToken {
    /// Unique identifier for the token
    pub id: Uuid,

    /// User the code was issued to
    pub user_id: UserId,

    /// The code handed to the user
    pub code: String,

    /// What redeeming the code authorizes
    pub purpose: Purpose,

    /// Timestamp when the token was issued
    pub created_at: DateTime<Utc>,

    /// Timestamp from which the token can no longer be redeemed
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been redeemed
    pub consumed: bool,
}

impl OtpToken {
    /// Creates a fresh, unconsumed token expiring `ttl` after `now`
    ///
    /// Fails with `Configuration` when `now + ttl` is not a representable instant.
    pub fn issue(
        user_id: UserId,
        code: impl Into<String>,
        purpose: Purpose,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> OtpResult<Self> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| OtpError::configuration(format!("ttl of {} overflows expiry", ttl)))?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            code: code.into(),
            purpose,
            created_at: now,
            expires_at,
            consumed: false,
        })
    }

    /// Checks if the token has expired at `now`
    ///
    /// A token is already expired at the exact instant `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks whether the token matches the request tuple exactly
    pub fn matches(&self, user_id: UserId, code: &str, purpose: &Purpose) -> bool {
        self.user_id == user_id
            && self.purpose == *purpose
            && self.code.len() == code.len()
            && constant_time_eq(self.code.as_bytes(), code.as_bytes())
    }

    /// The eligibility predicate every store's consume must implement
    ///
    /// `consumed = false AND now < expires_at AND (user_id, code, purpose)` match.
    pub fn is_redeemable_by(
        &self,
        user_id: UserId,
        code: &str,
        purpose: &Purpose,
        now: DateTime<Utc>,
    ) -> bool {
        !self.consumed && !self.is_expired_at(now) && self.matches(user_id, code, purpose)
    }

    /// Lifecycle state at `now`; consumption takes precedence over expiry
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.consumed {
            TokenState::Consumed
        } else if self.is_expired_at(now) {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

}
