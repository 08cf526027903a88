//! Concrete loader instantiations for the five hot entity lookups.
//!
//! Each supplies the bulk-fetch function against [`PrimaryStore`]. The
//! user and course fetches additionally run through the bulk cache-aside
//! path, because those single-entity reads are worth caching across
//! requests; the full lookup chain for them is loader memo, then remote
//! cache, then primary store. Lesson, enrollment, and progress rows
//! change too often per user action to be worth the remote round trip,
//! so their fetches go straight to the store.

use std::sync::Arc;

use async_trait::async_trait;
use lectern_core::{
    Course, CourseId, Enrollment, EnrollmentKey, Lesson, LessonId, LessonProgress, ProgressKey,
    StoreResult, User, UserId,
};

use crate::cache::{CacheAside, CacheKey, TtlClass};
use crate::store::PrimaryStore;

use super::batch::{BatchFetch, BatchItem, Loader};

/// Batching loader for users, cache-backed.
pub fn user_loader(store: Arc<dyn PrimaryStore>, cache: CacheAside) -> Loader<UserId, User> {
    Loader::new(Arc::new(UserFetch { store, cache }))
}

/// Batching loader for courses, cache-backed.
pub fn course_loader(store: Arc<dyn PrimaryStore>, cache: CacheAside) -> Loader<CourseId, Course> {
    Loader::new(Arc::new(CourseFetch { store, cache }))
}

/// Batching loader for lessons.
pub fn lesson_loader(store: Arc<dyn PrimaryStore>) -> Loader<LessonId, Lesson> {
    Loader::new(Arc::new(LessonFetch { store }))
}

/// Batching loader for enrollments addressed by (user, course).
pub fn enrollment_loader(store: Arc<dyn PrimaryStore>) -> Loader<EnrollmentKey, Enrollment> {
    Loader::new(Arc::new(EnrollmentFetch { store }))
}

/// Batching loader for progress rows addressed by (user, lesson).
pub fn progress_loader(store: Arc<dyn PrimaryStore>) -> Loader<ProgressKey, LessonProgress> {
    Loader::new(Arc::new(ProgressFetch { store }))
}

struct UserFetch {
    store: Arc<dyn PrimaryStore>,
    cache: CacheAside,
}

#[async_trait]
impl BatchFetch<UserId, User> for UserFetch {
    async fn fetch(&self, ids: &[UserId]) -> StoreResult<Vec<BatchItem<User>>> {
        let keys: Vec<CacheKey> = ids.iter().map(|id| CacheKey::user(*id)).collect();
        let rows: Vec<Option<User>> = self
            .cache
            .get_or_fetch_many(&keys, TtlClass::Medium, |misses| {
                let miss_ids: Vec<UserId> = misses.iter().map(|&i| ids[i]).collect();
                async move { self.store.users_by_ids(&miss_ids).await }
            })
            .await?;
        Ok(rows.into_iter().map(BatchItem::from).collect())
    }
}

struct CourseFetch {
    store: Arc<dyn PrimaryStore>,
    cache: CacheAside,
}

#[async_trait]
impl BatchFetch<CourseId, Course> for CourseFetch {
    async fn fetch(&self, ids: &[CourseId]) -> StoreResult<Vec<BatchItem<Course>>> {
        let keys: Vec<CacheKey> = ids.iter().map(|id| CacheKey::course(*id)).collect();
        let rows: Vec<Option<Course>> = self
            .cache
            .get_or_fetch_many(&keys, TtlClass::Long, |misses| {
                let miss_ids: Vec<CourseId> = misses.iter().map(|&i| ids[i]).collect();
                async move { self.store.courses_by_ids(&miss_ids).await }
            })
            .await?;
        Ok(rows.into_iter().map(BatchItem::from).collect())
    }
}

struct LessonFetch {
    store: Arc<dyn PrimaryStore>,
}

#[async_trait]
impl BatchFetch<LessonId, Lesson> for LessonFetch {
    async fn fetch(&self, ids: &[LessonId]) -> StoreResult<Vec<BatchItem<Lesson>>> {
        let rows = self.store.lessons_by_ids(ids).await?;
        Ok(rows.into_iter().map(BatchItem::from).collect())
    }
}

struct EnrollmentFetch {
    store: Arc<dyn PrimaryStore>,
}

#[async_trait]
impl BatchFetch<EnrollmentKey, Enrollment> for EnrollmentFetch {
    async fn fetch(&self, keys: &[EnrollmentKey]) -> StoreResult<Vec<BatchItem<Enrollment>>> {
        let rows = self.store.enrollments_by_keys(keys).await?;
        Ok(rows.into_iter().map(BatchItem::from).collect())
    }
}

struct ProgressFetch {
    store: Arc<dyn PrimaryStore>,
}

#[async_trait]
impl BatchFetch<ProgressKey, LessonProgress> for ProgressFetch {
    async fn fetch(&self, keys: &[ProgressKey]) -> StoreResult<Vec<BatchItem<LessonProgress>>> {
        let rows = self.store.progress_by_keys(keys).await?;
        Ok(rows.into_iter().map(BatchItem::from).collect())
    }
}
