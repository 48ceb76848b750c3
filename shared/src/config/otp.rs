//! One-time code policy and housekeeping configuration

use serde::{Deserialize, Serialize};

/// Default time-to-live of an issued code (5 minutes)
pub const DEFAULT_TTL_SECONDS: i64 = 300;

/// Longest accepted code lifetime (one day)
pub const MAX_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Default number of characters in an issued code
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Longest accepted retention of expired records (one year)
pub const MAX_RETENTION_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Alphabet used when generating codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeAlphabet {
    /// Decimal digits only
    #[default]
    Numeric,
    /// Upper-case letters and digits
    Alphanumeric,
}

/// Code issuance policy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Seconds a code stays redeemable after issuance
    pub ttl_seconds: i64,

    /// Number of characters in a generated code
    pub code_length: usize,

    /// Alphabet codes are drawn from
    pub code_alphabet: CodeAlphabet,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            code_length: DEFAULT_CODE_LENGTH,
            code_alphabet: CodeAlphabet::Numeric,
        }
    }
}

impl OtpConfig {
    /// Set the TTL in minutes
    pub fn with_ttl_minutes(mut self, minutes: i64) -> Self {
        self.ttl_seconds = minutes * 60;
        self
    }

    /// Set the code length and alphabet
    pub fn with_code_format(mut self, length: usize, alphabet: CodeAlphabet) -> Self {
        self.code_length = length;
        self.code_alphabet = alphabet;
        self
    }

    /// Check the policy for values no service can run with
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_TTL_SECONDS).contains(&self.ttl_seconds) {
            return Err(format!(
                "ttl_seconds must be between 1 and {}, got {}",
                MAX_TTL_SECONDS, self.ttl_seconds
            ));
        }
        if self.code_length == 0 || self.code_length > 32 {
            return Err(format!(
                "code_length must be between 1 and 32, got {}",
                self.code_length
            ));
        }
        Ok(())
    }
}

/// Configuration for periodic removal of expired tokens
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Whether housekeeping runs at all
    pub enabled: bool,

    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,

    /// How long an expired token is kept before deletion (in seconds)
    pub retention_seconds: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 600,    // Every 10 minutes
            retention_seconds: 86400, // Keep expired tokens for a day
        }
    }
}

impl CleanupConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_retention(self.retention_seconds)
    }
}

/// Retention bound shared by housekeeping and Redis key expiry
pub fn validate_retention(retention_seconds: i64) -> Result<(), String> {
    if !(0..=MAX_RETENTION_SECONDS).contains(&retention_seconds) {
        return Err(format!(
            "retention_seconds must be between 0 and {}, got {}",
            MAX_RETENTION_SECONDS, retention_seconds
        ));
    }
    Ok(())
}
