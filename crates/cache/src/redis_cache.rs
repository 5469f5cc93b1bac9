use crate::error::Result;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    /// Namespace for every key this service writes
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "docvault".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            key_prefix: std::env::var("CACHE_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }
}

/// Hits counted in the current fixed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub hits: u64,
    /// Seconds until the window resets; Redis answers -1/-2 when the key has no expiry
    pub resets_in: i64,
}

/// Redis-backed cache for membership roles and request counters
#[derive(Clone)]
pub struct Cache {
    manager: ConnectionManager,
    prefix: String,
}

impl Cache {
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url)?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self {
            manager,
            prefix: config.key_prefix,
        })
    }

    fn key(&self, key: &str) -> String {
        namespaced(&self.prefix, key)
    }

    /// Store a JSON value that expires after `ttl_seconds`
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(self.key(key), serialized, ttl_seconds)
            .await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;

        match value {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(self.key(key)).await?;
        Ok(())
    }

    /// Delete every key matching a glob pattern, walking the keyspace with SCAN
    pub async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.manager.clone();

        let mut keys = Vec::new();
        {
            let mut iter = conn.scan_match::<_, String>(self.key(pattern)).await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Ok(0);
        }

        let count = keys.len() as u64;
        conn.del::<_, ()>(keys).await?;
        Ok(count)
    }

    /// Count one hit in a fixed window.
    ///
    /// The expiry is set in the same MULTI as the increment, so a counter
    /// can never outlive its window.
    pub async fn hit_window(&self, key: &str, window_seconds: u64) -> Result<WindowCount> {
        let key = self.key(key);
        let mut conn = self.manager.clone();

        let (hits, resets_in): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(0)
            .arg("EX")
            .arg(window_seconds)
            .arg("NX")
            .ignore()
            .incr(&key, 1)
            .ttl(&key)
            .query_async(&mut conn)
            .await?;

        Ok(WindowCount { hits, resets_in })
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

fn namespaced(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    }
}

pub fn membership_cache_key(organization_id: &str, user_id: &str) -> String {
    format!("membership:{}:{}", organization_id, user_id)
}

pub fn rate_limit_key(scope: &str, identifier: &str) -> String {
    format!("ratelimit:{}:{}", scope, identifier)
}
