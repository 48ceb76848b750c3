//! # OTP Core
//!
//! Domain layer for issuing and redeeming one-time codes.
//! This crate contains the token entity, the clock and code generator
//! abstractions, the token store and identity interfaces, the purpose
//! registry, and the service that ties them together.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
