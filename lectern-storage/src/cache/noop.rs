//! Permanently-absent cache store.

use async_trait::async_trait;
use std::time::Duration;

use super::traits::CacheStore;

/// Cache store used when no remote cache is configured.
///
/// Every read misses and every write reports failure, which makes the
/// whole subsystem degrade to direct primary-store reads with no
/// divergent code path anywhere above the adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheStore;

impl NoopCacheStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheStore for NoopCacheStore {
    fn backend_name(&self) -> &'static str {
        "noop"
    }

    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> bool {
        false
    }

    async fn delete(&self, _key: &str) -> bool {
        false
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> u64 {
        0
    }

    async fn get_many(&self, keys: &[String]) -> Vec<Option<String>> {
        vec![None; keys.len()]
    }

    async fn set_many(&self, _entries: &[(String, String)], _ttl: Duration) -> bool {
        false
    }

    async fn increment(&self, _key: &str, _by: i64) -> Option<i64> {
        None
    }

    async fn exists(&self, _key: &str) -> bool {
        false
    }

    async fn ttl_remaining(&self, _key: &str) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_always_misses() {
        let store = NoopCacheStore::new();
        assert!(!store.set("k", "v", Duration::from_secs(60)).await);
        assert_eq!(store.get("k").await, None);
        assert!(!store.exists("k").await);
        assert_eq!(store.ttl_remaining("k").await, None);
    }

    #[tokio::test]
    async fn test_noop_bulk_get_stays_aligned() {
        let store = NoopCacheStore::new();
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(store.get_many(&keys).await, vec![None, None, None]);
    }
}
