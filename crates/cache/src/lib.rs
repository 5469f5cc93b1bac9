pub mod error;
pub mod redis_cache;

pub use error::{CacheError, Result};
pub use redis_cache::{membership_cache_key, rate_limit_key, Cache, CacheConfig, WindowCount};
