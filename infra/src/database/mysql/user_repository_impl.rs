//! MySQL implementation of the UserRepository trait.
//!
//! The `users` table belongs to the identity system; only its
//! `email_verified` flag is written here.

use async_trait::async_trait;
use sqlx::MySqlPool;

use otp_core::domain::UserId;
use otp_core::repositories::UserRepository;

/// MySQL implementation of UserRepository
pub struct MySqlUserRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlUserRepository {
    /// Create a new MySQL user repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn mark_email_verified(&self, user_id: UserId) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE users SET email_verified = TRUE WHERE id = ?")
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await?;

        // Zero rows: already verified or unknown user; both are fine
        if result.rows_affected() == 0 {
            tracing::debug!(user_id = %user_id, "No users row changed by email verification");
        }

        Ok(())
    }
}
