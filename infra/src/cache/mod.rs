//! Cache module for the Redis-backed token store
//!
//! Provides the Redis client with connection retry and the token store
//! built on server-side scripts.

pub mod otp_token_store;
pub mod redis_client;

pub use otp_token_store::RedisOtpTokenStore;
pub use redis_client::RedisClient;
