//! Domain layer containing the token entity and its value objects.

pub mod entities;
pub mod value_objects;

// Re-export commonly used domain types
pub use entities::{OtpToken, TokenState};
pub use value_objects::{Purpose, UserId};
