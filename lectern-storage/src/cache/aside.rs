//! Cache-aside engine.
//!
//! `get_or_fetch` is the single read primitive layered over the store
//! adapter: check the cache, fall through to the caller's producer on a
//! miss, backfill, return. Presence is what matters, never truthiness: a
//! cached empty list or `null` short-circuits the producer exactly like
//! any other hit, because the producer already answered that question
//! once.
//!
//! Producer failures pass through unchanged. The cache absorbs its own
//! failures (§ the adapter contract) but never someone else's; a read
//! that would have failed against the primary store fails here too.
//!
//! Invalidation is entity-scoped rather than key-scoped so a write path
//! makes one call and the whole cache footprint of the entity goes away.
//! Nothing here auto-invalidates: the write path that mutated the row
//! owns the timing.

use std::future::Future;
use std::sync::Arc;

use lectern_core::{
    CacheSettings, CategoryId, CourseId, EnrollmentKey, EntityKind, LessonId, ProgressKey,
    SessionId, StoreError, StoreResult, UserId,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::key::{CacheKey, KeyPattern, KeyPrefix};
use super::store_from_settings;
use super::traits::CacheStore;
use super::ttl::TtlClass;

/// The cache-aside read engine and invalidation surface.
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Build the engine over whichever store the settings select.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(store_from_settings(settings))
    }

    /// The underlying store adapter.
    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    /// Read `key` from the cache, or produce and backfill on a miss.
    ///
    /// The producer is not invoked on a hit. On a miss its result is
    /// returned to the caller whether or not the backfill write lands;
    /// a producer error propagates unchanged and caches nothing.
    pub async fn get_or_fetch<V, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: TtlClass,
        producer: F,
    ) -> StoreResult<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<V>>,
    {
        if let Some(raw) = self.store.get(key.as_str()).await {
            match serde_json::from_str::<V>(&raw) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(key = key.as_str(), error = %err, "malformed cache payload, treating as miss");
                }
            }
        }

        let value = producer().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                let _ = self.store.set(key.as_str(), &raw, ttl.duration()).await;
            }
            Err(err) => {
                warn!(key = key.as_str(), error = %err, "unserializable value, skipping backfill");
            }
        }

        Ok(value)
    }

    /// Bulk cache-aside over a key list.
    ///
    /// One `get_many` round trip finds the hits, the producer is invoked
    /// once with the indices of the misses (into `keys`) and must return
    /// values aligned to those indices, the misses are backfilled in one
    /// `set_many`, and the merged result comes back aligned to `keys`.
    pub async fn get_or_fetch_many<V, F, Fut>(
        &self,
        keys: &[CacheKey],
        ttl: TtlClass,
        producer: F,
    ) -> StoreResult<Vec<V>>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce(Vec<usize>) -> Fut,
        Fut: Future<Output = StoreResult<Vec<V>>>,
    {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let raw_keys: Vec<String> = keys.iter().map(|k| k.as_str().to_string()).collect();
        let mut cached = self.store.get_many(&raw_keys).await;
        if cached.len() != keys.len() {
            // Adapter broke its alignment contract; treat everything as a miss.
            warn!(
                expected = keys.len(),
                got = cached.len(),
                "cache bulk get misaligned, ignoring cached values"
            );
            cached = vec![None; keys.len()];
        }

        let mut merged: Vec<Option<V>> = Vec::with_capacity(keys.len());
        let mut misses: Vec<usize> = Vec::new();
        for (position, slot) in cached.into_iter().enumerate() {
            match slot {
                Some(raw) => match serde_json::from_str::<V>(&raw) {
                    Ok(value) => merged.push(Some(value)),
                    Err(err) => {
                        warn!(key = raw_keys[position].as_str(), error = %err, "malformed cache payload, treating as miss");
                        merged.push(None);
                        misses.push(position);
                    }
                },
                None => {
                    merged.push(None);
                    misses.push(position);
                }
            }
        }

        if misses.is_empty() {
            return Ok(merged.into_iter().flatten().collect());
        }

        let produced = producer(misses.clone()).await?;
        if produced.len() != misses.len() {
            return Err(StoreError::QueryFailed {
                kind: kind_of(keys[misses[0]].prefix()),
                reason: format!(
                    "bulk producer returned {} values for {} misses",
                    produced.len(),
                    misses.len()
                ),
            });
        }

        let mut fills: Vec<(String, String)> = Vec::with_capacity(misses.len());
        for (&position, value) in misses.iter().zip(produced.into_iter()) {
            match serde_json::to_string(&value) {
                Ok(raw) => fills.push((raw_keys[position].clone(), raw)),
                Err(err) => {
                    warn!(key = raw_keys[position].as_str(), error = %err, "unserializable value, skipping backfill");
                }
            }
            merged[position] = Some(value);
        }
        if !fills.is_empty() {
            let _ = self.store.set_many(&fills, ttl.duration()).await;
        }

        Ok(merged.into_iter().flatten().collect())
    }

    // ========================================================================
    // ENTITY-SCOPED INVALIDATION
    // ========================================================================

    /// Drop a user's cache footprint: the user row plus every enrollment
    /// and progress entry keyed by that user.
    pub async fn invalidate_user(&self, id: UserId) -> u64 {
        let mut removed = self.delete_one(&CacheKey::user(id)).await;
        removed += self
            .store
            .delete_by_pattern(&KeyPattern::user_enrollments(id))
            .await;
        removed += self
            .store
            .delete_by_pattern(&KeyPattern::user_progress(id))
            .await;
        debug!(user = %id, removed, "invalidated user cache footprint");
        removed
    }

    /// Drop a course's cache footprint: the direct and full payloads, the
    /// by-slug entry when the slug is known, every lesson entry under the
    /// course, its enrollment entries, and the aggregate catalog listing.
    pub async fn invalidate_course(&self, id: CourseId, slug: Option<&str>) -> u64 {
        let mut removed = self.delete_one(&CacheKey::course(id)).await;
        removed += self.delete_one(&CacheKey::course_full(id)).await;
        if let Some(slug) = slug {
            removed += self.delete_one(&CacheKey::course_slug(slug)).await;
        }
        // `lesson:*:{course}` also matches the `lesson:course:{course}`
        // listing entry.
        removed += self
            .store
            .delete_by_pattern(&KeyPattern::course_lessons(id))
            .await;
        removed += self
            .store
            .delete_by_pattern(&KeyPattern::course_enrollments(id))
            .await;
        removed += self.delete_one(&CacheKey::course_list()).await;
        debug!(course = %id, removed, "invalidated course cache footprint");
        removed
    }

    /// Drop a lesson's entries plus the aggregates that embed it: the
    /// course's lesson listing and its full payload.
    pub async fn invalidate_lesson(&self, lesson_id: LessonId, course_id: CourseId) -> u64 {
        let mut removed = self.delete_one(&CacheKey::lesson(lesson_id, course_id)).await;
        removed += self.delete_one(&CacheKey::lessons_of_course(course_id)).await;
        removed += self.delete_one(&CacheKey::course_full(course_id)).await;
        debug!(lesson = %lesson_id, course = %course_id, removed, "invalidated lesson cache footprint");
        removed
    }

    /// Drop one enrollment entry.
    pub async fn invalidate_enrollment(&self, key: &EnrollmentKey) -> u64 {
        self.delete_one(&CacheKey::enrollment(key)).await
    }

    /// Drop one progress entry.
    pub async fn invalidate_progress(&self, key: &ProgressKey) -> u64 {
        self.delete_one(&CacheKey::progress(key)).await
    }

    /// Drop a category and the category listing.
    pub async fn invalidate_category(&self, id: CategoryId) -> u64 {
        let removed =
            self.delete_one(&CacheKey::category(id)).await + self.delete_one(&CacheKey::category_list()).await;
        debug!(category = %id, removed, "invalidated category cache footprint");
        removed
    }

    /// Drop one live-session entry.
    pub async fn invalidate_session(&self, id: SessionId) -> u64 {
        self.delete_one(&CacheKey::session(id)).await
    }

    /// Drop the site-settings singleton entry.
    pub async fn invalidate_site_settings(&self) -> u64 {
        self.delete_one(&CacheKey::site_settings()).await
    }

    async fn delete_one(&self, key: &CacheKey) -> u64 {
        u64::from(self.store.delete(key.as_str()).await)
    }
}

fn kind_of(prefix: KeyPrefix) -> EntityKind {
    match prefix {
        KeyPrefix::User => EntityKind::User,
        KeyPrefix::Session => EntityKind::LiveSession,
        KeyPrefix::Course | KeyPrefix::CourseList => EntityKind::Course,
        KeyPrefix::Lesson => EntityKind::Lesson,
        KeyPrefix::Enrollment => EntityKind::Enrollment,
        KeyPrefix::SiteSettings => EntityKind::SiteSettings,
        KeyPrefix::Category => EntityKind::Category,
        KeyPrefix::Progress => EntityKind::Progress,
    }
}
