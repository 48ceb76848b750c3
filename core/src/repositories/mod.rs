pub mod otp_token;
pub mod user;

pub use otp_token::{InMemoryOtpTokenRepository, OtpTokenRepository};
pub use user::{InMemoryUserRepository, UserRepository};
