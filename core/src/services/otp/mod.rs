//! One-time code issuance and redemption
//!
//! - `issue` generates a code, persists it with an expiry and hands it back
//!   for delivery
//! - `redeem` atomically consumes a matching token and then applies the
//!   purpose's side effect

mod config;
mod service;
mod types;

#[cfg(test)]
mod tests;

pub use config::OtpServiceConfig;
pub use service::OtpService;
pub use types::IssuedOtp;
