pub mod cache;

pub use cache::create_redis_client;
pub use cache::CacheKey;
pub use cache::CacheStore;
pub use cache::RedisCache;

#[cfg(test)]
pub use cache::MockCacheStore;
