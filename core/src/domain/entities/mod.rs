//! Domain entities representing core business objects.

pub mod otp_token;

// Re-export commonly used types
pub use otp_token::{OtpToken, TokenState};
