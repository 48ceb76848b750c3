//! In-memory identity store for single-process setups and tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::value_objects::UserId;

use super::trait_::UserRepository;

/// Records which users have a verified email address
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    verified: Arc<RwLock<HashSet<UserId>>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `mark_email_verified` has been applied to the user
    pub async fn is_email_verified(&self, user_id: UserId) -> bool {
        self.verified.read().await.contains(&user_id)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn mark_email_verified(&self, user_id: UserId) -> anyhow::Result<()> {
        self.verified.write().await.insert(user_id);
        Ok(())
    }
}
