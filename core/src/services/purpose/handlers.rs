//! Built-in purpose handlers

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::value_objects::{Purpose, UserId};
use crate::repositories::UserRepository;

use super::registry::PurposeHandler;

/// Marks the user's email address verified through the identity store
pub struct EmailVerificationHandler<U: UserRepository + ?Sized> {
    users: Arc<U>,
}

impl<U: UserRepository + ?Sized> EmailVerificationHandler<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<U: UserRepository + ?Sized> PurposeHandler for EmailVerificationHandler<U> {
    async fn on_redeemed(&self, user_id: UserId) -> anyhow::Result<()> {
        self.users.mark_email_verified(user_id).await?;
        tracing::info!(
            user_id = %user_id,
            event = "email_verified",
            "Marked email address as verified"
        );
        Ok(())
    }
}

/// No state change; the caller continues its own flow (e.g. password reset)
#[derive(Debug, Clone)]
pub struct AcknowledgeHandler {
    purpose: Purpose,
}

impl AcknowledgeHandler {
    pub fn new(purpose: Purpose) -> Self {
        Self { purpose }
    }
}

#[async_trait]
impl PurposeHandler for AcknowledgeHandler {
    async fn on_redeemed(&self, user_id: UserId) -> anyhow::Result<()> {
        tracing::debug!(
            user_id = %user_id,
            purpose = %self.purpose,
            "Code redeemed, no side effect registered"
        );
        Ok(())
    }
}
