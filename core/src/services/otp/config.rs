//! Configuration for the one-time code service

use chrono::Duration;

use otp_shared::config::{CodeAlphabet, OtpConfig};

use crate::errors::{OtpError, OtpResult};

/// Validated code policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpServiceConfig {
    /// How long an issued code stays redeemable
    pub ttl: Duration,
    /// Number of characters in a generated code
    pub code_length: usize,
    /// Alphabet codes are drawn from
    pub code_alphabet: CodeAlphabet,
}

impl Default for OtpServiceConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
            code_length: otp_shared::config::otp::DEFAULT_CODE_LENGTH,
            code_alphabet: CodeAlphabet::Numeric,
        }
    }
}

impl OtpServiceConfig {
    /// Build from the shared configuration section, rejecting unusable values
    pub fn from_config(config: &OtpConfig) -> OtpResult<Self> {
        config
            .validate()
            .map_err(|message| OtpError::Configuration { message })?;

        let ttl = Duration::try_seconds(config.ttl_seconds).ok_or_else(|| {
            OtpError::configuration(format!("ttl_seconds {} is out of range", config.ttl_seconds))
        })?;

        Ok(Self {
            ttl,
            code_length: config.code_length,
            code_alphabet: config.code_alphabet,
        })
    }
}

impl TryFrom<&OtpConfig> for OtpServiceConfig {
    type Error = OtpError;

    fn try_from(config: &OtpConfig) -> Result<Self, Self::Error> {
        Self::from_config(config)
    }
}
