//! MySQL implementation of the OtpTokenRepository trait.
//!
//! Consumption is a single conditional `UPDATE`: the eligibility predicate
//! lives in its `WHERE` clause and `rows_affected()` reports whether this
//! call won. Concurrent callers serialize on InnoDB row locks, so at most
//! one of them sees an affected row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use otp_core::domain::{OtpToken, Purpose, UserId};
use otp_core::errors::{OtpError, OtpResult};
use otp_core::repositories::OtpTokenRepository;

/// MySQL implementation of OtpTokenRepository
pub struct MySqlOtpTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlOtpTokenRepository {
    /// Create a new MySQL token repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to OtpToken entity
    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> OtpResult<OtpToken> {
        let id: String = row
            .try_get("id")
            .map_err(|e| OtpError::storage(format!("Failed to get id: {}", e)))?;
        let purpose: String = row
            .try_get("purpose")
            .map_err(|e| OtpError::storage(format!("Failed to get purpose: {}", e)))?;

        Ok(OtpToken {
            id: Uuid::parse_str(&id)
                .map_err(|e| OtpError::storage(format!("Invalid token UUID: {}", e)))?,
            user_id: UserId::new(
                row.try_get("user_id")
                    .map_err(|e| OtpError::storage(format!("Failed to get user_id: {}", e)))?,
            ),
            code: row
                .try_get("code")
                .map_err(|e| OtpError::storage(format!("Failed to get code: {}", e)))?,
            purpose: Purpose::new(purpose),
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| OtpError::storage(format!("Failed to get created_at: {}", e)))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| OtpError::storage(format!("Failed to get expires_at: {}", e)))?,
            consumed: row
                .try_get("consumed")
                .map_err(|e| OtpError::storage(format!("Failed to get consumed: {}", e)))?,
        })
    }
}

#[async_trait]
impl OtpTokenRepository for MySqlOtpTokenRepository {
    async fn create(&self, token: OtpToken) -> OtpResult<OtpToken> {
        let query = r#"
            INSERT INTO otp_tokens (
                id, user_id, code, purpose, created_at, expires_at, consumed
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(token.id.to_string())
            .bind(token.user_id.into_inner())
            .bind(&token.code)
            .bind(token.purpose.as_str())
            .bind(token.created_at)
            .bind(token.expires_at)
            .bind(token.consumed)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(token_id = %token.id, error = %e, "Failed to insert otp token");
                OtpError::storage(format!("Failed to save otp token: {}", e))
            })?;

        Ok(token)
    }

    async fn try_consume(
        &self,
        user_id: UserId,
        code: &str,
        purpose: &Purpose,
        now: DateTime<Utc>,
    ) -> OtpResult<bool> {
        let query = r#"
            UPDATE otp_tokens
            SET consumed = TRUE
            WHERE user_id = ?
              AND code = ?
              AND purpose = ?
              AND consumed = FALSE
              AND expires_at > ?
            ORDER BY expires_at, id
            LIMIT 1
        "#;

        let result = sqlx::query(query)
            .bind(user_id.into_inner())
            .bind(code)
            .bind(purpose.as_str())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %user_id,
                    purpose = %purpose,
                    error = %e,
                    "Failed to consume otp token"
                );
                OtpError::storage(format!("Failed to consume otp token: {}", e))
            })?;

        tracing::debug!(
            user_id = %user_id,
            purpose = %purpose,
            rows_affected = result.rows_affected(),
            "Conditional consume executed"
        );

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> OtpResult<Option<OtpToken>> {
        let query = r#"
            SELECT id, user_id, code, purpose, created_at, expires_at, consumed
            FROM otp_tokens
            WHERE id = ?
        "#;

        let result = sqlx::query(query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| OtpError::storage(format!("Failed to find otp token: {}", e)))?;

        match result {
            Some(row) => Ok(Some(Self::row_to_token(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> OtpResult<u64> {
        let result = sqlx::query("DELETE FROM otp_tokens WHERE expires_at <= ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete expired otp tokens");
                OtpError::storage(format!("Failed to delete expired otp tokens: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}
