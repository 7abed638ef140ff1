pub mod graph;
pub mod redis;

pub use self::graph::{GraphStore, Neo4jGraph};
pub use self::redis::create_redis_client;
pub use self::redis::{CacheKey, CacheStore, RedisCache};
