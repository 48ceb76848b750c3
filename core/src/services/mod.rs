//! Business services containing domain logic and use cases.

pub mod cleanup;
pub mod code_generator;
pub mod otp;
pub mod purpose;

// Re-export commonly used types
pub use cleanup::{CleanupResult, OtpCleanupService};
pub use code_generator::{AlphanumericCodeGenerator, CodeGenerator, NumericCodeGenerator};
pub use otp::{IssuedOtp, OtpService, OtpServiceConfig};
pub use purpose::{AcknowledgeHandler, EmailVerificationHandler, PurposeHandler, PurposeRegistry};
