//! Lectern Storage - Batching and Caching Data Access
//!
//! The data-access core under the Lectern course platform: a
//! request-scoped batch loader layered beneath a multi-tier cache-aside
//! store. The primary relational store stays the source of truth; this
//! crate only accelerates reads to it and never fails a caller because
//! the cache is down.
//!
//! Layers, bottom up:
//!
//! - [`cache`]: the non-throwing [`CacheStore`] adapter (Redis, memory,
//!   or permanently-absent), the fixed keyspace and TTL classes, and the
//!   [`CacheAside`] engine with entity-scoped invalidation.
//! - [`store`]: the [`PrimaryStore`] read contract plus an in-memory
//!   implementation for tests and development.
//! - [`loader`]: the generic batch [`Loader`], the five entity loaders,
//!   and the per-request [`LoaderContext`] propagation.
//! - [`cached_store`]: the [`CachedStore`] read client composing the
//!   store with the cache engine.
//!
//! A point read resolves as: loader memo (per request), then remote
//! cache (cross request), then primary store, backfilling on the way
//! out.

pub mod cache;
pub mod cached_store;
pub mod loader;
pub mod store;
pub mod testing;

pub use cache::{
    store_from_settings, CacheAside, CacheKey, CacheStore, KeyPattern, KeyPrefix,
    MemoryCacheStore, NoopCacheStore, RedisCacheStore, TtlClass,
};
pub use cached_store::CachedStore;
pub use loader::{
    course_loader, enrollment_loader, lesson_loader, progress_loader, user_loader,
    with_loader_scope, BatchFetch, BatchItem, Loader, LoaderContext,
};
pub use store::{FailingStore, InMemoryStore, PrimaryStore};
