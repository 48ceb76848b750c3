//! Integration tests for the Redis token store
//!
//! Run with a Redis server: `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;

use otp_core::domain::{OtpToken, Purpose, UserId};
use otp_core::repositories::OtpTokenRepository;
use otp_infra::cache::{RedisClient, RedisOtpTokenStore};
use otp_shared::config::CacheConfig;

async fn store() -> RedisOtpTokenStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    // Fresh prefix per test keeps runs independent
    let config = CacheConfig::new(url).with_prefix(format!("otp-test-{}", uuid::Uuid::new_v4()));
    let client = RedisClient::new(config)
        .await
        .expect("Failed to create Redis client");
    RedisOtpTokenStore::new(client)
}

fn token(user: i64, code: &str, purpose: Purpose) -> OtpToken {
    OtpToken::issue(UserId::new(user), code, purpose, Utc::now(), Duration::minutes(5))
        .expect("five minute ttl is representable")
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_create_find_and_consume_once() {
    let store = store().await;
    let token = store
        .create(token(7, "482913", Purpose::EMAIL_VERIFICATION))
        .await
        .unwrap();

    // Timestamps are stored with microsecond precision
    let found = store.find_by_id(token.id).await.unwrap().unwrap();
    assert_eq!(found.id, token.id);
    assert_eq!(found.code, token.code);
    assert_eq!(found.purpose, token.purpose);
    assert_eq!(found.expires_at.timestamp_micros(), token.expires_at.timestamp_micros());
    assert!(!found.consumed);

    let now = Utc::now();
    assert!(store
        .try_consume(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION, now)
        .await
        .unwrap());
    assert!(!store
        .try_consume(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION, now)
        .await
        .unwrap());
    assert!(store.find_by_id(token.id).await.unwrap().unwrap().consumed);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_create_retry_does_not_reset_consumed() {
    let store = store().await;
    let token = store
        .create(token(7, "482913", Purpose::EMAIL_VERIFICATION))
        .await
        .unwrap();
    assert!(store
        .try_consume(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION, Utc::now())
        .await
        .unwrap());

    store.create(token.clone()).await.unwrap();
    assert!(store.find_by_id(token.id).await.unwrap().unwrap().consumed);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_expired_and_mismatched_tokens_are_rejected() {
    let store = store().await;
    let token = store
        .create(token(7, "100234", Purpose::PASSWORD_RESET))
        .await
        .unwrap();

    assert!(!store
        .try_consume(UserId::new(7), "100234", &Purpose::PASSWORD_RESET, token.expires_at)
        .await
        .unwrap());
    assert!(!store
        .try_consume(UserId::new(8), "100234", &Purpose::PASSWORD_RESET, Utc::now())
        .await
        .unwrap());
    assert!(!store
        .try_consume(UserId::new(7), "100234", &Purpose::EMAIL_VERIFICATION, Utc::now())
        .await
        .unwrap());
    assert!(!store
        .try_consume(UserId::new(7), "000000", &Purpose::PASSWORD_RESET, Utc::now())
        .await
        .unwrap());

    assert!(!store.find_by_id(token.id).await.unwrap().unwrap().consumed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires Redis to be running
async fn test_concurrent_consume_has_one_winner() {
    let store = Arc::new(store().await);
    store
        .create(token(7, "482913", Purpose::EMAIL_VERIFICATION))
        .await
        .unwrap();

    let mut set = JoinSet::new();
    for _ in 0..32 {
        let store = Arc::clone(&store);
        set.spawn(async move {
            store
                .try_consume(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION, Utc::now())
                .await
                .unwrap()
        });
    }

    let mut wins = 0;
    while let Some(result) = set.join_next().await {
        if result.unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
}
