//! Cache store trait
//!
//! The adapter boundary over the remote key/value store. Every method is
//! non-throwing by construction: transport failures are logged inside
//! the implementation and collapse into the absent/failed return value,
//! so no caller above this line ever writes cache failure handling. The
//! cache is an optimization, never a dependency.

use async_trait::async_trait;
use std::time::Duration;

/// Remote cache adapter contract.
///
/// Absence of a value and an unreachable cache are deliberately
/// indistinguishable: both surface as `None`/`false`, and the layer
/// above falls through to its producer either way.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Implementation name for logs and diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Get a value. `None` means missing, expired, or unreachable.
    async fn get(&self, key: &str) -> Option<String>;

    /// Set a value with a TTL. Returns whether the write was applied.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> bool;

    /// Delete a key. Returns whether a key was removed.
    async fn delete(&self, key: &str) -> bool;

    /// Delete every key matching a `*` glob pattern. Returns the number
    /// of keys removed.
    async fn delete_by_pattern(&self, pattern: &str) -> u64;

    /// Bulk get, aligned to `keys`.
    async fn get_many(&self, keys: &[String]) -> Vec<Option<String>>;

    /// Bulk set with one shared TTL. Returns whether the batch was applied.
    async fn set_many(&self, entries: &[(String, String)], ttl: Duration) -> bool;

    /// Atomically add `by` to a counter key, returning the new value.
    async fn increment(&self, key: &str, by: i64) -> Option<i64>;

    /// Whether the key currently exists.
    async fn exists(&self, key: &str) -> bool;

    /// Remaining TTL for the key, if it exists and has one.
    async fn ttl_remaining(&self, key: &str) -> Option<Duration>;
}
