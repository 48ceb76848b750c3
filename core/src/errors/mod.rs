//! Error types for the one-time code lifecycle.
//!
//! An ineligible redemption is not an error: `redeem` reports it as `false`.
//! Only conditions the caller has to act on are represented here.

use thiserror::Error;

use crate::domain::value_objects::{Purpose, UserId};

/// Errors raised while issuing or redeeming codes
#[derive(Error, Debug)]
pub enum OtpError {
    /// The backing store is unavailable or rejected the operation
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// The purpose has no registered side effect
    #[error("Unknown purpose: {purpose}")]
    UnknownPurpose { purpose: Purpose },

    /// The token was consumed but its side effect failed.
    ///
    /// The consumption cannot be undone; the effect needs manual reconciliation.
    #[error("Side effect for purpose '{purpose}' failed for user {user_id}")]
    SideEffect {
        purpose: Purpose,
        user_id: UserId,
        #[source]
        source: anyhow::Error,
    },

    /// The service was constructed with an unusable policy
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl OtpError {
    /// Build a storage error from any displayable cause
    pub fn storage(message: impl std::fmt::Display) -> Self {
        OtpError::Storage {
            message: message.to_string(),
        }
    }

    /// Build a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        OtpError::Configuration {
            message: message.into(),
        }
    }

    /// Whether the redemption consumed the token despite the error
    pub fn is_consumed(&self) -> bool {
        matches!(self, OtpError::SideEffect { .. })
    }
}

pub type OtpResult<T> = Result<T, OtpError>;
