//! Purposes a code can be issued for and what redeeming one does
//!
//! The registry is the closed set of known purposes. Supporting a new
//! purpose means registering one [`PurposeHandler`].

mod handlers;
mod registry;

pub use handlers::{AcknowledgeHandler, EmailVerificationHandler};
pub use registry::{PurposeHandler, PurposeRegistry};
