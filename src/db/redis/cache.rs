use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::error::AppResult;
use crate::models::{CategoryId, StudentId};

/// Cache keys, one namespace per entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Category(CategoryId),
    Student(StudentId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Category(id) => write!(f, "category:{}", id),
            CacheKey::Student(id) => write!(f, "student:{}", id),
        }
    }
}

/// Key/value cache holding serialized recommendation lists
///
/// No compare-and-set or expiry contract is assumed; an absent key is a miss.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>>;

    async fn set(&self, key: &CacheKey, value: String) -> AppResult<()>;
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed cache
#[derive(Clone)]
pub struct RedisCache {
    redis_client: Client,
    ttl: Option<u64>,
}

impl RedisCache {
    /// Entries written through this cache expire after `ttl` seconds, or never when `None`
    pub fn new(redis_client: Client, ttl: Option<u64>) -> Self {
        Self { redis_client, ttl }
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis get failed");
            e
        })?;
        Ok(cached)
    }

    async fn set(&self, key: &CacheKey, value: String) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let result: redis::RedisResult<()> = match self.ttl {
            Some(ttl) => conn.set_ex(key.to_string(), value, ttl).await,
            None => conn.set(key.to_string(), value).await,
        };
        result.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis set failed");
            e
        })?;

        tracing::debug!(key = %key, ttl = ?self.ttl, "Cached value");
        Ok(())
    }
}
