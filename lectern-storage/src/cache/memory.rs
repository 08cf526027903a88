//! In-process cache store.
//!
//! Backs cache-enabled tests and development setups that have no remote
//! cache to talk to. Entries carry the same TTL semantics as the remote
//! store: an expired entry is indistinguishable from one that was never
//! written.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::traits::CacheStore;

struct Entry {
    value: String,
    /// `None` for entries created without a TTL (counters).
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// `CacheStore` over an `RwLock`-guarded map.
///
/// Expired entries are dropped lazily on access; nothing here spawns a
/// sweeper task.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        recover(self.entries.read())
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_live(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entries = recover(self.entries.read());
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            _ => None,
        }
    }
}

fn recover<G>(result: Result<G, std::sync::PoisonError<G>>) -> G {
    result.unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.read_live(key)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Some(Instant::now() + ttl),
        };
        recover(self.entries.write()).insert(key.to_string(), entry);
        true
    }

    async fn delete(&self, key: &str) -> bool {
        recover(self.entries.write()).remove(key).is_some()
    }

    async fn delete_by_pattern(&self, pattern: &str) -> u64 {
        let mut entries = recover(self.entries.write());
        let matched: Vec<String> = entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        for key in &matched {
            entries.remove(key);
        }
        matched.len() as u64
    }

    async fn get_many(&self, keys: &[String]) -> Vec<Option<String>> {
        let now = Instant::now();
        let entries = recover(self.entries.read());
        keys.iter()
            .map(|key| match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
                _ => None,
            })
            .collect()
    }

    async fn set_many(&self, batch: &[(String, String)], ttl: Duration) -> bool {
        let deadline = Instant::now() + ttl;
        let mut entries = recover(self.entries.write());
        for (key, value) in batch {
            entries.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    expires_at: Some(deadline),
                },
            );
        }
        true
    }

    async fn increment(&self, key: &str, by: i64) -> Option<i64> {
        let now = Instant::now();
        let mut entries = recover(self.entries.write());
        let current = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => entry.value.parse::<i64>().ok()?,
            _ => 0,
        };
        let next = current + by;
        // Preserve the existing deadline; a fresh counter has no TTL,
        // matching the remote store's INCR-creates-persistent behavior.
        let expires_at = entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .and_then(|e| e.expires_at);
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Some(next)
    }

    async fn exists(&self, key: &str) -> bool {
        self.read_live(key).is_some()
    }

    async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = recover(self.entries.read());
        let entry = entries.get(key)?;
        if entry.is_expired(now) {
            return None;
        }
        entry.expires_at.map(|deadline| deadline - now)
    }
}

/// Match `text` against a glob `pattern` where `*` matches any run of
/// characters, including the key separator. This mirrors how the remote
/// store's `SCAN MATCH` treats `*`, so the same invalidation pattern
/// behaves identically against both stores.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && (pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            // Backtrack: let the last `*` swallow one more character.
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pat[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_roundtrips() {
        let store = MemoryCacheStore::new();
        assert!(store.set("user:1", "ada", Duration::from_secs(60)).await);
        assert_eq!(store.get("user:1").await, Some("ada".to_string()));
        assert!(store.exists("user:1").await);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let store = MemoryCacheStore::new();
        store.set("k", "v", Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(25)).await;

        assert_eq!(store.get("k").await, None);
        assert!(!store.exists("k").await);
        assert_eq!(store.ttl_remaining("k").await, None);
    }

    #[tokio::test]
    async fn test_ttl_remaining_is_bounded_by_write_ttl() {
        let store = MemoryCacheStore::new();
        store.set("k", "v", Duration::from_secs(60)).await;

        let remaining = store.ttl_remaining("k").await.expect("entry exists");
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_delete_by_pattern_scopes_to_matches() {
        let store = MemoryCacheStore::new();
        let ttl = Duration::from_secs(60);
        store.set("enrollment:u1:c1", "a", ttl).await;
        store.set("enrollment:u1:c2", "b", ttl).await;
        store.set("enrollment:u2:c1", "c", ttl).await;

        let removed = store.delete_by_pattern("enrollment:u1:*").await;

        assert_eq!(removed, 2);
        assert_eq!(store.get("enrollment:u1:c1").await, None);
        assert_eq!(
            store.get("enrollment:u2:c1").await,
            Some("c".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_many_aligns_to_keys() {
        let store = MemoryCacheStore::new();
        store.set("a", "1", Duration::from_secs(60)).await;
        store.set("c", "3", Duration::from_secs(60)).await;

        let got = store
            .get_many(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await;

        assert_eq!(
            got,
            vec![Some("1".to_string()), None, Some("3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_set_many_writes_every_entry() {
        let store = MemoryCacheStore::new();
        let batch = vec![
            ("x".to_string(), "1".to_string()),
            ("y".to_string(), "2".to_string()),
        ];
        assert!(store.set_many(&batch, Duration::from_secs(60)).await);
        assert_eq!(store.get("x").await, Some("1".to_string()));
        assert_eq!(store.get("y").await, Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_increment_creates_and_advances_counter() {
        let store = MemoryCacheStore::new();
        assert_eq!(store.increment("hits", 1).await, Some(1));
        assert_eq!(store.increment("hits", 4).await, Some(5));
    }

    #[tokio::test]
    async fn test_increment_rejects_non_numeric_value() {
        let store = MemoryCacheStore::new();
        store.set("k", "not-a-number", Duration::from_secs(60)).await;
        assert_eq!(store.increment("k", 1).await, None);
    }

    #[test]
    fn test_glob_star_crosses_separators() {
        assert!(glob_match("lesson:*:c9", "lesson:l1:c9"));
        assert!(glob_match("lesson:*:c9", "lesson:course:c9"));
        assert!(!glob_match("lesson:*:c9", "lesson:l1:c10"));
    }

    #[test]
    fn test_glob_literal_and_edge_patterns() {
        assert!(glob_match("user:42", "user:42"));
        assert!(!glob_match("user:42", "user:421"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("a*b*c", "a-x-b-y-c"));
        assert!(!glob_match("a*b*c", "a-x-b-y"));
        assert!(glob_match("", ""));
        assert!(!glob_match("", "x"));
    }
}
