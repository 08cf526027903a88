//! Remote cache store over Redis.
//!
//! The connection is a lazily-created `ConnectionManager` shared by every
//! in-flight request; the manager multiplexes commands and re-establishes
//! the connection with capped exponential backoff. Pattern deletion walks
//! the keyspace with `SCAN MATCH` rather than `KEYS`, which would block
//! the server on large keyspaces.
//!
//! Every transport failure is logged here and collapses into the
//! absent/failed return value. The one retry this adapter performs itself
//! is for `READONLY` replies: a failed-over replica answers reads but
//! rejects writes, and one retry through the manager lands the command on
//! the promoted primary.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use lectern_core::CacheSettings;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, ErrorKind, RedisResult};
use tracing::{debug, warn};

use super::traits::CacheStore;

/// Backoff multiplier between reconnect attempts, in milliseconds.
const RECONNECT_FACTOR_MS: u64 = 100;

/// `CacheStore` backed by a Redis deployment.
pub struct RedisCacheStore {
    settings: CacheSettings,
    manager: tokio::sync::Mutex<Option<ConnectionManager>>,
}

impl RedisCacheStore {
    /// Create a store for the given settings. No connection is made until
    /// the first command needs one.
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            manager: tokio::sync::Mutex::new(None),
        }
    }

    /// The shared connection, established on first use.
    ///
    /// A failed attempt is not memoized: the next command tries again, so
    /// a cache that comes up after this process does is picked up without
    /// a restart.
    async fn connection(&self) -> Option<ConnectionManager> {
        let mut slot = self.manager.lock().await;
        if let Some(manager) = slot.as_ref() {
            return Some(manager.clone());
        }

        let url = self.settings.redis_url.as_deref()?;
        let client = match Client::open(url) {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "invalid cache endpoint, running without remote cache");
                return None;
            }
        };

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(self.settings.connect_timeout)
            .set_response_timeout(self.settings.response_timeout)
            .set_number_of_retries(self.settings.retry_count)
            .set_factor(RECONNECT_FACTOR_MS)
            .set_max_delay(self.settings.max_backoff.as_millis() as u64);

        match ConnectionManager::new_with_config(client, config).await {
            Ok(manager) => {
                debug!("remote cache connection established");
                *slot = Some(manager.clone());
                Some(manager)
            }
            Err(err) => {
                warn!(error = %err, "remote cache unreachable, degrading to absent");
                None
            }
        }
    }

    /// Run one command, retrying once on a `READONLY` reply.
    async fn run<T, F, Fut>(&self, op: &'static str, attempt: F) -> Option<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        match attempt().await {
            Ok(value) => Some(value),
            Err(err) if err.kind() == ErrorKind::ReadOnly => {
                warn!(op, error = %err, "cache replied READONLY, retrying once");
                match attempt().await {
                    Ok(value) => Some(value),
                    Err(err) => {
                        warn!(op, error = %err, "cache command failed after READONLY retry");
                        None
                    }
                }
            }
            Err(err) => {
                warn!(op, error = %err, "cache command failed");
                None
            }
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Option<String> {
        let manager = self.connection().await?;
        self.run("GET", || {
            let mut conn = manager.clone();
            let key = key.to_string();
            async move { conn.get::<_, Option<String>>(key).await }
        })
        .await
        .flatten()
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let Some(manager) = self.connection().await else {
            return false;
        };
        let seconds = ttl.as_secs().max(1);
        self.run("SETEX", || {
            let mut conn = manager.clone();
            let key = key.to_string();
            let value = value.to_string();
            async move { conn.set_ex::<_, _, ()>(key, value, seconds).await }
        })
        .await
        .is_some()
    }

    async fn delete(&self, key: &str) -> bool {
        let Some(manager) = self.connection().await else {
            return false;
        };
        self.run("DEL", || {
            let mut conn = manager.clone();
            let key = key.to_string();
            async move { conn.del::<_, u64>(key).await }
        })
        .await
        .is_some_and(|removed| removed > 0)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> u64 {
        let Some(manager) = self.connection().await else {
            return 0;
        };

        let mut scan_conn = manager.clone();
        let matched = match scan_conn.scan_match::<&str, String>(pattern).await {
            Ok(mut iter) => {
                let mut keys = Vec::new();
                while let Some(key) = iter.next_item().await {
                    keys.push(key);
                }
                keys
            }
            Err(err) => {
                warn!(pattern, error = %err, "cache SCAN failed");
                return 0;
            }
        };

        if matched.is_empty() {
            return 0;
        }

        self.run("DEL", || {
            let mut conn = manager.clone();
            let keys = matched.clone();
            async move { conn.del::<_, u64>(keys).await }
        })
        .await
        .unwrap_or(0)
    }

    async fn get_many(&self, keys: &[String]) -> Vec<Option<String>> {
        if keys.is_empty() {
            return Vec::new();
        }
        let Some(manager) = self.connection().await else {
            return vec![None; keys.len()];
        };
        self.run("MGET", || {
            let mut conn = manager.clone();
            let keys = keys.to_vec();
            async move { conn.mget::<_, Vec<Option<String>>>(keys).await }
        })
        .await
        .filter(|values| values.len() == keys.len())
        .unwrap_or_else(|| vec![None; keys.len()])
    }

    async fn set_many(&self, entries: &[(String, String)], ttl: Duration) -> bool {
        if entries.is_empty() {
            return true;
        }
        let Some(manager) = self.connection().await else {
            return false;
        };
        let seconds = ttl.as_secs().max(1);
        self.run("SETEX pipeline", || {
            let mut conn = manager.clone();
            let mut pipe = redis::pipe();
            for (key, value) in entries {
                pipe.set_ex(key, value, seconds).ignore();
            }
            async move {
                let () = pipe.query_async(&mut conn).await?;
                Ok(())
            }
        })
        .await
        .is_some()
    }

    async fn increment(&self, key: &str, by: i64) -> Option<i64> {
        let manager = self.connection().await?;
        self.run("INCRBY", || {
            let mut conn = manager.clone();
            let key = key.to_string();
            async move { conn.incr::<_, _, i64>(key, by).await }
        })
        .await
    }

    async fn exists(&self, key: &str) -> bool {
        let Some(manager) = self.connection().await else {
            return false;
        };
        self.run("EXISTS", || {
            let mut conn = manager.clone();
            let key = key.to_string();
            async move { conn.exists::<_, bool>(key).await }
        })
        .await
        .unwrap_or(false)
    }

    async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let manager = self.connection().await?;
        let ttl = self
            .run("TTL", || {
                let mut conn = manager.clone();
                let key = key.to_string();
                async move { conn.ttl::<_, i64>(key).await }
            })
            .await?;
        // -2 is "no such key", -1 is "exists without expiry".
        u64::try_from(ttl).ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_settings() -> CacheSettings {
        CacheSettings {
            redis_url: Some("redis://127.0.0.1:1".to_string()),
            connect_timeout: Duration::from_millis(100),
            response_timeout: Duration::from_millis(100),
            retry_count: 0,
            max_backoff: Duration::from_millis(100),
            disabled: false,
        }
    }

    #[tokio::test]
    async fn test_missing_url_degrades_to_absent() {
        let store = RedisCacheStore::new(CacheSettings::default());
        assert_eq!(store.get("k").await, None);
        assert!(!store.set("k", "v", Duration::from_secs(60)).await);
        assert!(!store.delete("k").await);
        assert_eq!(store.delete_by_pattern("k:*").await, 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_without_error() {
        let store = RedisCacheStore::new(unreachable_settings());
        assert_eq!(store.get("k").await, None);
        assert_eq!(store.increment("k", 1).await, None);
        assert!(!store.exists("k").await);
        assert_eq!(store.ttl_remaining("k").await, None);
    }

    #[tokio::test]
    async fn test_bulk_get_stays_aligned_when_unreachable() {
        let store = RedisCacheStore::new(unreachable_settings());
        let keys = vec!["a".to_string(), "b".to_string()];
        assert_eq!(store.get_many(&keys).await, vec![None, None]);
    }
}
