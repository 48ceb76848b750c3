//! Types returned by the one-time code service

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A freshly issued code, to be handed to the delivery channel
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedOtp {
    /// Identifier of the stored token
    pub token_id: Uuid,
    /// The code to deliver to the user
    pub code: String,
    /// Instant from which the code is no longer accepted
    pub expires_at: DateTime<Utc>,
}

// Keeps the code out of logs and panic messages
impl fmt::Debug for IssuedOtp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedOtp")
            .field("token_id", &self.token_id)
            .field("code", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_code() {
        let issued = IssuedOtp {
            token_id: Uuid::new_v4(),
            code: "482913".to_string(),
            expires_at: Utc::now(),
        };
        let debug = format!("{issued:?}");
        assert!(!debug.contains("482913"));
        assert!(debug.contains("<redacted>"));
    }
}
