//! MySQL-specific database implementations
//!
//! This module contains MySQL implementations of repository traits
//! using SQLx for database operations.

pub mod otp_token_repository_impl;
pub mod user_repository_impl;

// Re-export the MySQL implementations
pub use otp_token_repository_impl::MySqlOtpTokenRepository;
pub use user_repository_impl::MySqlUserRepository;
