//! Multi-tier cache subsystem.
//!
//! A remote key/value cache sits in front of the primary store behind a
//! non-throwing adapter boundary: [`CacheStore`] implementations convert
//! every transport failure into the absent/failed return value, so the
//! [`CacheAside`] engine and everything above it contain zero cache
//! failure handling. With no endpoint configured the [`NoopCacheStore`]
//! takes the same code path and every read falls through to the primary
//! store.
//!
//! Keys come from the fixed [`CacheKey`] constructors, writes carry one
//! [`TtlClass`] each, and invalidation is entity-scoped through the
//! engine's `invalidate_*` helpers.

pub mod aside;
pub mod key;
pub mod memory;
pub mod noop;
pub mod redis;
pub mod traits;
pub mod ttl;

pub use aside::CacheAside;
pub use key::{CacheKey, KeyPattern, KeyPrefix};
pub use memory::MemoryCacheStore;
pub use noop::NoopCacheStore;
pub use redis::RedisCacheStore;
pub use traits::CacheStore;
pub use ttl::TtlClass;

use lectern_core::CacheSettings;
use std::sync::Arc;
use tracing::info;

/// Select the store the settings call for: Redis when an endpoint is
/// configured and not disabled, otherwise the permanently-absent store.
pub fn store_from_settings(settings: &CacheSettings) -> Arc<dyn CacheStore> {
    if settings.is_enabled() {
        info!("remote cache enabled");
        Arc::new(RedisCacheStore::new(settings.clone()))
    } else {
        info!("no remote cache configured, reads go straight to the primary store");
        Arc::new(NoopCacheStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_without_url_select_noop() {
        let store = store_from_settings(&CacheSettings::default());
        assert_eq!(store.backend_name(), "noop");
    }

    #[test]
    fn test_settings_with_url_select_redis() {
        let settings = CacheSettings {
            redis_url: Some("redis://localhost:6379".to_string()),
            ..CacheSettings::default()
        };
        let store = store_from_settings(&settings);
        assert_eq!(store.backend_name(), "redis");
    }

    #[test]
    fn test_disabled_flag_overrides_url() {
        let settings = CacheSettings {
            redis_url: Some("redis://localhost:6379".to_string()),
            disabled: true,
            ..CacheSettings::default()
        };
        let store = store_from_settings(&settings);
        assert_eq!(store.backend_name(), "noop");
    }
}
