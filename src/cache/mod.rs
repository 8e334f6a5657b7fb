use redis::{Client, RedisError, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }

    /// Get a value from cache
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> redis::RedisResult<Option<T>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.connection.clone())
            .await?;

        match value {
            Some(v) => {
                let deserialized = serde_json::from_str(&v).map_err(|e| {
                    RedisError::from((
                        redis::ErrorKind::TypeError,
                        "Deserialization error",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(deserialized))
            }
            None => Ok(None),
        }
    }

    /// Set a value with a TTL in seconds
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> redis::RedisResult<()> {
        let serialized = serde_json::to_string(value).map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "Serialization error",
                e.to_string(),
            ))
        })?;

        redis::cmd("SET")
            .arg(key)
            .arg(serialized)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut self.connection.clone())
            .await
    }

    /// Read a counter, treating a missing key as 0
    pub async fn counter(&self, key: &str) -> redis::RedisResult<u64> {
        let value: Option<u64> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.connection.clone())
            .await?;
        Ok(value.unwrap_or(0))
    }

    /// Atomically increment a counter and return the new value
    pub async fn incr(&self, key: &str) -> redis::RedisResult<u64> {
        redis::cmd("INCR")
            .arg(key)
            .query_async(&mut self.connection.clone())
            .await
    }
}

/// Cache key generators
///
/// Subdomain lookups are stamped with a generation. Every mutation bumps the
/// generation, so an entry filled from a read that raced a mutation lands
/// under a generation nobody reads again and simply expires.
pub mod keys {
    /// Counter bumped by every portfolio mutation
    pub fn subdomain_generation() -> &'static str {
        "portfolio:subdomain-generation"
    }

    /// Published-site lookup by subdomain within one generation
    pub fn portfolio_subdomain(generation: u64, subdomain: &str) -> String {
        format!("portfolio:subdomain:{generation}:{subdomain}")
    }
}

/// Wrapper type for Actix-web app data
pub type CacheData = Arc<RedisCache>;
