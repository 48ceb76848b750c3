//! Identity collaborator interface.
//!
//! User records are owned by another system. The one-time code flow only
//! needs to flip a single flag once a code proves ownership of an address.

use async_trait::async_trait;

use crate::domain::value_objects::UserId;

/// Operations the code service needs from the identity store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Mark the user's email address as verified
    ///
    /// Must be idempotent: marking an already verified (or unknown) user
    /// is not an error.
    async fn mark_email_verified(&self, user_id: UserId) -> anyhow::Result<()>;
}
