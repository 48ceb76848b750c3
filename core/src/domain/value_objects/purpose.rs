//! Purpose a token was issued for.
//!
//! A purpose is an identifier; which purposes are valid is decided by the
//! [`PurposeRegistry`](crate::services::purpose::PurposeRegistry), not by
//! this type. New purposes are introduced by registering a handler.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Intended use of a token (e.g. `email_verification`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Purpose(Cow<'static, str>);

impl Purpose {
    /// Proving ownership of an email address
    pub const EMAIL_VERIFICATION: Purpose = Purpose(Cow::Borrowed("email_verification"));

    /// Authorizing a password change
    pub const PASSWORD_RESET: Purpose = Purpose(Cow::Borrowed("password_reset"));

    /// Create a purpose from an identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The identifier as stored alongside the token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Purpose {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Purpose {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for Purpose {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
