//! Key-value stores behind the recommendation cache.
//!
//! Values are opaque strings with a per-key TTL. `RedisCacheStore` is the
//! production backend; `MemoryCacheStore` serves single-node deployments and tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use redis::aio::ConnectionManager;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Keys deleted per `SCAN` round trip during prefix eviction.
const SCAN_BATCH: usize = 100;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Replaces the whole entry.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Deletes the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Deletes every key starting with `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct MemoryEntry {
    value: String,
    ttl: Duration,
}

/// Gives every entry the TTL it was written with, restarting on overwrite.
struct EntryTtl;

impl Expiry<String, MemoryEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &MemoryEntry,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &MemoryEntry,
        _updated_at: std::time::Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Process-local store backed by a bounded `moka` cache. Expired and
/// least-recently-used entries are reclaimed by moka whether or not they are read again.
pub struct MemoryCacheStore {
    entries: Cache<String, MemoryEntry>,
}

impl MemoryCacheStore {
    pub fn new(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryTtl)
            .build();
        Self { entries }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.run_pending_tasks().await;
        self.entries.iter().count()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), MemoryEntry { value, ttl })
            .await;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let mut removed = 0;
        for key in keys {
            if self.entries.remove(key).await.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let matching: Vec<Arc<String>> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key)
            .collect();

        let mut removed = 0;
        for key in matching {
            if self.entries.remove(key.as_str()).await.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    pub async fn connect(client: redis::Client) -> Result<Self, CacheError> {
        let conn = ConnectionManager::new(client).await?;
        info!("Redis cache store connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.conn.clone())
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let seconds = ttl.as_secs().max(1);
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async::<_, ()>(&mut self.conn.clone())
            .await?;
        debug!("SET {key} EX {seconds}");
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let removed: u64 = redis::cmd("DEL")
            .arg(keys)
            .query_async(&mut self.conn.clone())
            .await?;
        Ok(removed)
    }

    /// `SCAN MATCH` + `DEL` in batches; never `KEYS`, which blocks the server.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let pattern = format!("{prefix}*");
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    warn!("Redis SCAN failed for {pattern}: {e}");
                    CacheError::Redis(e)
                })?;

            if !keys.is_empty() {
                let deleted: u64 = redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                removed += deleted;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!("Deleted {removed} keys matching {pattern}");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryCacheStore::new(100);
        store.set("a", "1".to_string(), MINUTE).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(store.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_never_returned_past_expiry() {
        let store = MemoryCacheStore::new(100);
        store
            .set("short", "1".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        store.set("long", "2".to_string(), MINUTE).await.unwrap();
        assert!(store.get("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("long").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_unread_expired_entries_are_reclaimed() {
        let store = MemoryCacheStore::new(100);
        for i in 0..10 {
            store
                .set(&format!("old:{i}"), "x".to_string(), Duration::from_millis(20))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let store = MemoryCacheStore::new(5);
        for i in 0..50 {
            store
                .set(&format!("k:{i}"), "x".to_string(), MINUTE)
                .await
                .unwrap();
        }
        assert!(store.len().await <= 5);
    }

    #[tokio::test]
    async fn test_set_replaces_entry_and_ttl() {
        let store = MemoryCacheStore::new(100);
        store
            .set("a", "old".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        store.set("a", "new".to_string(), MINUTE).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.get("a").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_delete_counts_existing_keys() {
        let store = MemoryCacheStore::new(100);
        store.set("a", "1".to_string(), MINUTE).await.unwrap();
        store.set("b", "2".to_string(), MINUTE).await.unwrap();

        let removed = store
            .delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_delete_prefix_only_touches_prefix() {
        let store = MemoryCacheStore::new(100);
        store.set("recommendedJobs:4:x:0:10", "1".to_string(), MINUTE).await.unwrap();
        store.set("recommendedJobs:4:x:1:10", "2".to_string(), MINUTE).await.unwrap();
        store.set("recommendedJobs:42:x:0:10", "3".to_string(), MINUTE).await.unwrap();

        let removed = store.delete_prefix("recommendedJobs:4:").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len().await, 1);
    }
}
