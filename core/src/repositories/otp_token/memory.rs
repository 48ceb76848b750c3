//! In-process token store
//!
//! Suitable for a single process only. The lookup and the flip of
//! `consumed` happen under the same write guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::OtpToken;
use crate::domain::value_objects::{Purpose, UserId};
use crate::errors::OtpResult;

use super::trait_::OtpTokenRepository;

/// Token store backed by a `HashMap`
#[derive(Clone, Default)]
pub struct InMemoryOtpTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, OtpToken>>>,
}

impl InMemoryOtpTokenRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, consumed and expired included
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl OtpTokenRepository for InMemoryOtpTokenRepository {
    async fn create(&self, token: OtpToken) -> OtpResult<OtpToken> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn try_consume(
        &self,
        user_id: UserId,
        code: &str,
        purpose: &Purpose,
        now: DateTime<Utc>,
    ) -> OtpResult<bool> {
        let mut tokens = self.tokens.write().await;

        // Earliest-expiring eligible record wins, same order as the SQL store
        let candidate = tokens
            .values_mut()
            .filter(|t| t.is_redeemable_by(user_id, code, purpose, now))
            .min_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.id.cmp(&b.id)));

        match candidate {
            Some(token) => {
                token.consumed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> OtpResult<Option<OtpToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(&id).cloned())
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> OtpResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at > cutoff);
        Ok((before - tokens.len()) as u64)
    }
}
