//! Cached read client.
//!
//! `CachedStore` wraps a [`PrimaryStore`] with the cache-aside engine so
//! call sites read through one object and the cache stays transparent.
//! Each read carries the TTL class matching how often its data actually
//! changes; progress rows churn with every video heartbeat while the
//! category taxonomy changes a few times a year.
//!
//! The invalidation helpers are re-exposed here so the write path that
//! mutates an entity has one obvious hook to call. This layer never
//! initiates writes and never invalidates on its own.

use std::sync::Arc;

use lectern_core::{
    Category, CategoryId, Course, CourseDetail, CourseId, Enrollment, EnrollmentKey, Lesson,
    LessonId, LessonProgress, LiveSession, ProgressKey, SessionId, SiteSettings, StoreResult, User,
    UserId,
};

use crate::cache::{CacheAside, CacheKey, TtlClass};
use crate::store::PrimaryStore;

/// Read client composing the primary store with the cache-aside engine.
#[derive(Clone)]
pub struct CachedStore {
    store: Arc<dyn PrimaryStore>,
    cache: CacheAside,
}

impl CachedStore {
    pub fn new(store: Arc<dyn PrimaryStore>, cache: CacheAside) -> Self {
        Self { store, cache }
    }

    /// The underlying primary store.
    pub fn store(&self) -> &Arc<dyn PrimaryStore> {
        &self.store
    }

    /// The cache-aside engine.
    pub fn cache(&self) -> &CacheAside {
        &self.cache
    }

    // ========================================================================
    // CACHED READS
    // ========================================================================

    pub async fn user_get(&self, id: UserId) -> StoreResult<Option<User>> {
        self.cache
            .get_or_fetch(&CacheKey::user(id), TtlClass::Medium, || {
                self.store.user_get(id)
            })
            .await
    }

    pub async fn course_get(&self, id: CourseId) -> StoreResult<Option<Course>> {
        self.cache
            .get_or_fetch(&CacheKey::course(id), TtlClass::Long, || {
                self.store.course_get(id)
            })
            .await
    }

    /// The course page payload: course, lessons, category.
    pub async fn course_detail(&self, id: CourseId) -> StoreResult<Option<CourseDetail>> {
        self.cache
            .get_or_fetch(&CacheKey::course_full(id), TtlClass::Long, || {
                self.store.course_detail(id)
            })
            .await
    }

    pub async fn course_by_slug(&self, slug: &str) -> StoreResult<Option<Course>> {
        self.cache
            .get_or_fetch(&CacheKey::course_slug(slug), TtlClass::Long, || {
                self.store.course_by_slug(slug)
            })
            .await
    }

    /// The published-course catalog listing.
    pub async fn course_list(&self) -> StoreResult<Vec<Course>> {
        self.cache
            .get_or_fetch(&CacheKey::course_list(), TtlClass::Medium, || {
                self.store.course_list()
            })
            .await
    }

    /// A lesson within its course; the course id is part of the key
    /// because every route that reads a lesson already knows it.
    pub async fn lesson_get(
        &self,
        lesson_id: LessonId,
        course_id: CourseId,
    ) -> StoreResult<Option<Lesson>> {
        self.cache
            .get_or_fetch(&CacheKey::lesson(lesson_id, course_id), TtlClass::Long, || {
                self.store.lesson_get(lesson_id)
            })
            .await
    }

    pub async fn lessons_by_course(&self, course_id: CourseId) -> StoreResult<Vec<Lesson>> {
        self.cache
            .get_or_fetch(
                &CacheKey::lessons_of_course(course_id),
                TtlClass::Long,
                || self.store.lessons_by_course(course_id),
            )
            .await
    }

    pub async fn enrollment_get(&self, key: &EnrollmentKey) -> StoreResult<Option<Enrollment>> {
        self.cache
            .get_or_fetch(&CacheKey::enrollment(key), TtlClass::Short, || {
                self.store.enrollment_get(key)
            })
            .await
    }

    pub async fn progress_get(&self, key: &ProgressKey) -> StoreResult<Option<LessonProgress>> {
        self.cache
            .get_or_fetch(&CacheKey::progress(key), TtlClass::Instant, || {
                self.store.progress_get(key)
            })
            .await
    }

    pub async fn category_get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        self.cache
            .get_or_fetch(&CacheKey::category(id), TtlClass::Day, || {
                self.store.category_get(id)
            })
            .await
    }

    pub async fn category_list(&self) -> StoreResult<Vec<Category>> {
        self.cache
            .get_or_fetch(&CacheKey::category_list(), TtlClass::Day, || {
                self.store.category_list()
            })
            .await
    }

    pub async fn session_get(&self, id: SessionId) -> StoreResult<Option<LiveSession>> {
        self.cache
            .get_or_fetch(&CacheKey::session(id), TtlClass::Short, || {
                self.store.session_get(id)
            })
            .await
    }

    pub async fn site_settings(&self) -> StoreResult<Option<SiteSettings>> {
        self.cache
            .get_or_fetch(&CacheKey::site_settings(), TtlClass::VeryLong, || {
                self.store.site_settings()
            })
            .await
    }

    // ========================================================================
    // INVALIDATION HOOKS FOR WRITE PATHS
    // ========================================================================

    pub async fn invalidate_user(&self, id: UserId) -> u64 {
        self.cache.invalidate_user(id).await
    }

    pub async fn invalidate_course(&self, id: CourseId, slug: Option<&str>) -> u64 {
        self.cache.invalidate_course(id, slug).await
    }

    pub async fn invalidate_lesson(&self, lesson_id: LessonId, course_id: CourseId) -> u64 {
        self.cache.invalidate_lesson(lesson_id, course_id).await
    }

    pub async fn invalidate_enrollment(&self, key: &EnrollmentKey) -> u64 {
        self.cache.invalidate_enrollment(key).await
    }

    pub async fn invalidate_progress(&self, key: &ProgressKey) -> u64 {
        self.cache.invalidate_progress(key).await
    }

    pub async fn invalidate_category(&self, id: CategoryId) -> u64 {
        self.cache.invalidate_category(id).await
    }

    pub async fn invalidate_session(&self, id: SessionId) -> u64 {
        self.cache.invalidate_session(id).await
    }

    pub async fn invalidate_site_settings(&self) -> u64 {
        self.cache.invalidate_site_settings().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheStore, NoopCacheStore};
    use crate::store::InMemoryStore;
    use crate::testing::{make_course, make_lesson, make_settings, make_user};
    use std::time::Duration;

    fn cached(store: Arc<InMemoryStore>) -> CachedStore {
        CachedStore::new(store, CacheAside::new(Arc::new(MemoryCacheStore::new())))
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let store = Arc::new(InMemoryStore::new());
        let ada = make_user("ada@example.com");
        store.insert_user(ada.clone());
        let client = cached(store.clone());

        let first = client.user_get(ada.user_id).await.expect("first");
        let second = client.user_get(ada.user_id).await.expect("second");

        assert_eq!(first, second);
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test]
    async fn test_reads_carry_their_ttl_class() {
        let store = Arc::new(InMemoryStore::new());
        let ada = make_user("ada@example.com");
        store.insert_user(ada.clone());
        let client = cached(store.clone());

        client.user_get(ada.user_id).await.expect("read");

        let remaining = client
            .cache()
            .store()
            .ttl_remaining(CacheKey::user(ada.user_id).as_str())
            .await
            .expect("entry exists");
        assert!(remaining <= TtlClass::Medium.duration());
        assert!(remaining > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_course_detail_caches_the_full_payload() {
        let store = Arc::new(InMemoryStore::new());
        let course = make_course("rust-for-bakers");
        store.insert_course(course.clone());
        store.insert_lesson(make_lesson(course.course_id, 1));
        let client = cached(store.clone());

        let detail = client
            .course_detail(course.course_id)
            .await
            .expect("detail")
            .expect("exists");
        assert_eq!(detail.lessons.len(), 1);

        client.course_detail(course.course_id).await.expect("again");
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test]
    async fn test_invalidation_reopens_the_read_path() {
        let store = Arc::new(InMemoryStore::new());
        let course = make_course("rust-for-bakers");
        store.insert_course(course.clone());
        let client = cached(store.clone());

        client.course_get(course.course_id).await.expect("warm");
        client.course_by_slug(&course.slug).await.expect("warm slug");
        assert_eq!(store.queries(), 2);

        client
            .invalidate_course(course.course_id, Some(&course.slug))
            .await;

        client.course_get(course.course_id).await.expect("reread");
        client.course_by_slug(&course.slug).await.expect("reread slug");
        assert_eq!(store.queries(), 4);
    }

    #[tokio::test]
    async fn test_empty_course_list_is_cached() {
        let store = Arc::new(InMemoryStore::new());
        let client = cached(store.clone());

        assert!(client.course_list().await.expect("list").is_empty());
        assert!(client.course_list().await.expect("list").is_empty());

        // Empty is a cached answer, not a miss.
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test]
    async fn test_degraded_client_reads_straight_through() {
        let store = Arc::new(InMemoryStore::new());
        let settings = make_settings();
        store.set_site_settings(settings.clone());
        let client = CachedStore::new(
            store.clone(),
            CacheAside::new(Arc::new(NoopCacheStore::new())),
        );

        for _ in 0..2 {
            let read = client.site_settings().await.expect("read").expect("set");
            assert_eq!(read.site_name, settings.site_name);
        }

        // No cache, so both reads hit the store; neither failed.
        assert_eq!(store.queries(), 2);
    }
}
