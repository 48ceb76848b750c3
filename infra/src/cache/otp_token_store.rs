//! Redis-backed token store
//!
//! Key layout (`{p}` is the configured prefix):
//! - `{p}:token:{id}` hash with the token fields, timestamps as epoch micros
//! - `{p}:lookup:{user_id}:{purpose}:{code}` set of token ids for an exact tuple
//!
//! Create and consume each run as one server-side script, so no other
//! command interleaves between the eligibility check and the flip of
//! `consumed`. Keys expire `retention_seconds` after the token does, which
//! replaces explicit housekeeping.
//!
//! The consume script touches token hashes it derives from the lookup set,
//! so all keys of one deployment must live on a single Redis node.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use redis::{AsyncCommands, Script};
use std::collections::HashMap;
use uuid::Uuid;

use otp_core::domain::{OtpToken, Purpose, UserId};
use otp_core::errors::{OtpError, OtpResult};
use otp_core::repositories::OtpTokenRepository;

use super::redis_client::RedisClient;

const CREATE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
redis.call('HSET', KEYS[1],
    'id', ARGV[1],
    'user_id', ARGV[2],
    'code', ARGV[3],
    'purpose', ARGV[4],
    'created_at', ARGV[5],
    'expires_at', ARGV[6],
    'consumed', '0')
redis.call('PEXPIRE', KEYS[1], ARGV[7])
redis.call('SADD', KEYS[2], ARGV[1])
if redis.call('PTTL', KEYS[2]) < tonumber(ARGV[7]) then
    redis.call('PEXPIRE', KEYS[2], ARGV[7])
end
return 1
"#;

const CONSUME_SCRIPT: &str = r#"
local ids = redis.call('SMEMBERS', KEYS[1])
local now = tonumber(ARGV[5])
local best_key, best_id, best_exp = nil, nil, nil
for _, id in ipairs(ids) do
    local key = ARGV[1] .. id
    local f = redis.call('HMGET', key, 'user_id', 'code', 'purpose', 'expires_at', 'consumed')
    if not f[1] then
        redis.call('SREM', KEYS[1], id)
    elseif f[1] == ARGV[2] and f[2] == ARGV[3] and f[3] == ARGV[4] and f[5] == '0' then
        local exp = tonumber(f[4])
        local earlier = best_exp == nil or exp < best_exp or (exp == best_exp and id < best_id)
        if exp > now and earlier then
            best_key, best_id, best_exp = key, id, exp
        end
    end
end
if best_key == nil then
    return 0
end
redis.call('HSET', best_key, 'consumed', '1')
return 1
"#;

/// Token store holding records as Redis hashes
#[derive(Clone)]
pub struct RedisOtpTokenStore {
    client: RedisClient,
    create_script: Script,
    consume_script: Script,
}

impl RedisOtpTokenStore {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            create_script: Script::new(CREATE_SCRIPT),
            consume_script: Script::new(CONSUME_SCRIPT),
        }
    }

    fn token_key_prefix(&self) -> String {
        self.client.key("token:")
    }

    fn token_key(&self, id: Uuid) -> String {
        format!("{}{}", self.token_key_prefix(), id)
    }

    fn lookup_key(&self, user_id: UserId, code: &str, purpose: &Purpose) -> String {
        self.client
            .key(&format!("lookup:{}:{}:{}", user_id, purpose, code))
    }


    fn hash_to_token(fields: &HashMap<String, String>) -> OtpResult<OtpToken> {
        let field = |name: &str| {
            fields
                .get(name)
                .ok_or_else(|| OtpError::storage(format!("Token hash missing field '{}'", name)))
        };
        let parse_i64 = |name: &str| -> OtpResult<i64> {
            field(name)?
                .parse::<i64>()
                .map_err(|e| OtpError::storage(format!("Invalid '{}' in token hash: {}", name, e)))
        };

        Ok(OtpToken {
            id: Uuid::parse_str(field("id")?)
                .map_err(|e| OtpError::storage(format!("Invalid token UUID: {}", e)))?,
            user_id: UserId::new(parse_i64("user_id")?),
            code: field("code")?.clone(),
            purpose: Purpose::new(field("purpose")?.clone()),
            created_at: from_micros(parse_i64("created_at")?)?,
            expires_at: from_micros(parse_i64("expires_at")?)?,
            consumed: field("consumed")? == "1",
        })
    }
}

/// Key lifetime: token TTL plus the retention, at least one millisecond
fn key_ttl_millis(token: &OtpToken, retention_seconds: i64) -> OtpResult<i64> {
    Duration::try_seconds(retention_seconds)
        .and_then(|retention| (token.expires_at - token.created_at).checked_add(&retention))
        .map(|lifetime| lifetime.num_milliseconds().max(1))
        .ok_or_else(|| {
            OtpError::configuration(format!(
                "retention_seconds {} is out of range",
                retention_seconds
            ))
        })
}

fn from_micros(micros: i64) -> OtpResult<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(secs, nanos)
        .single()
        .ok_or_else(|| OtpError::storage(format!("Timestamp out of range: {}", micros)))
}

#[async_trait]
impl OtpTokenRepository for RedisOtpTokenStore {
    async fn create(&self, token: OtpToken) -> OtpResult<OtpToken> {
        let token_key = self.token_key(token.id);
        let lookup_key = self.lookup_key(token.user_id, &token.code, &token.purpose);
        let ttl_ms = key_ttl_millis(&token, self.client.config().retention_seconds)?;
        let id = token.id.to_string();
        let user_id = token.user_id.into_inner();
        let created_at = token.created_at.timestamp_micros();
        let expires_at = token.expires_at.timestamp_micros();

        // The script is a no-op when the hash exists, so retrying is safe
        let result = self
            .client
            .execute_with_retry(|mut conn| {
                let script = self.create_script.clone();
                let token_key = token_key.clone();
                let lookup_key = lookup_key.clone();
                let id = id.clone();
                let code = token.code.clone();
                let purpose = token.purpose.as_str().to_string();

                Box::pin(async move {
                    script
                        .key(token_key)
                        .key(lookup_key)
                        .arg(id)
                        .arg(user_id)
                        .arg(code)
                        .arg(purpose)
                        .arg(created_at)
                        .arg(expires_at)
                        .arg(ttl_ms)
                        .invoke_async::<_, i64>(&mut conn)
                        .await
                })
            })
            .await;

        match result {
            Ok(_) => Ok(token),
            Err(e) => {
                tracing::error!(
                    token_id = %token.id,
                    error = %e,
                    "Failed to store otp token in Redis"
                );
                Err(OtpError::storage(format!("Failed to save otp token: {}", e)))
            }
        }
    }

    async fn try_consume(
        &self,
        user_id: UserId,
        code: &str,
        purpose: &Purpose,
        now: DateTime<Utc>,
    ) -> OtpResult<bool> {
        let lookup_key = self.lookup_key(user_id, code, purpose);
        let mut conn = self.client.connection();

        // Executed once: a retry after an unseen success would report false
        let consumed: i64 = self
            .consume_script
            .key(&lookup_key)
            .arg(self.token_key_prefix())
            .arg(user_id.into_inner())
            .arg(code)
            .arg(purpose.as_str())
            .arg(now.timestamp_micros())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %user_id,
                    purpose = %purpose,
                    error = %e,
                    "Failed to consume otp token in Redis"
                );
                OtpError::storage(format!("Failed to consume otp token: {}", e))
            })?;

        tracing::debug!(
            user_id = %user_id,
            purpose = %purpose,
            consumed = consumed,
            "Consume script executed"
        );

        Ok(consumed == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> OtpResult<Option<OtpToken>> {
        let key = self.token_key(id);

        let fields: HashMap<String, String> = self
            .client
            .execute_with_retry(|mut conn| {
                let key = key.clone();
                Box::pin(async move { conn.hgetall(key).await })
            })
            .await
            .map_err(|e| OtpError::storage(format!("Failed to find otp token: {}", e)))?;

        if fields.is_empty() {
            return Ok(None);
        }

        Self::hash_to_token(&fields).map(Some)
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> OtpResult<u64> {
        tracing::debug!(cutoff = %cutoff, "Redis token keys expire on their own");
        Ok(0)
    }
}
