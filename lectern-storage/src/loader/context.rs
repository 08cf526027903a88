//! Request-scoped loader propagation.
//!
//! One [`LoaderContext`] holds the five entity loaders for one logical
//! request. [`with_loader_scope`] makes a fresh context ambient for the
//! dynamic extent of a future via task-local storage, so nothing in the
//! call chain threads loaders through its signature and nothing leaks
//! between concurrent requests. Code running outside any scope still
//! works: [`LoaderContext::current`] hands it a disposable one-off set,
//! which costs the cross-call batching but nothing else.

use std::future::Future;
use std::sync::Arc;

use lectern_core::{
    Course, CourseId, Enrollment, EnrollmentKey, Lesson, LessonId, LessonProgress, ProgressKey,
    User, UserId,
};

use crate::cache::CacheAside;
use crate::store::PrimaryStore;

use super::batch::Loader;
use super::entities::{
    course_loader, enrollment_loader, lesson_loader, progress_loader, user_loader,
};

tokio::task_local! {
    static ACTIVE_LOADERS: Arc<LoaderContext>;
}

/// The per-request set of entity loaders.
pub struct LoaderContext {
    pub users: Loader<UserId, User>,
    pub courses: Loader<CourseId, Course>,
    pub lessons: Loader<LessonId, Lesson>,
    pub enrollments: Loader<EnrollmentKey, Enrollment>,
    pub progress: Loader<ProgressKey, LessonProgress>,
}

impl LoaderContext {
    /// Build a fresh loader set over the given store and cache engine.
    pub fn new(store: Arc<dyn PrimaryStore>, cache: CacheAside) -> Arc<Self> {
        Arc::new(Self {
            users: user_loader(Arc::clone(&store), cache.clone()),
            courses: course_loader(Arc::clone(&store), cache),
            lessons: lesson_loader(Arc::clone(&store)),
            enrollments: enrollment_loader(Arc::clone(&store)),
            progress: progress_loader(store),
        })
    }

    /// The ambient loader set, or a disposable one-off set when called
    /// outside any scope.
    pub fn current(store: &Arc<dyn PrimaryStore>, cache: &CacheAside) -> Arc<Self> {
        ACTIVE_LOADERS
            .try_with(Arc::clone)
            .unwrap_or_else(|_| Self::new(Arc::clone(store), cache.clone()))
    }

    /// Forget every memoized entity, across all five loaders. For write
    /// paths that must re-read heavily within the same request.
    pub fn clear_all(&self) {
        self.users.clear_all();
        self.courses.clear_all();
        self.lessons.clear_all();
        self.enrollments.clear_all();
        self.progress.clear_all();
    }
}

/// Run `fut` with a fresh loader set as the ambient context for its
/// dynamic extent. Every inbound request gets exactly one of these.
pub async fn with_loader_scope<F>(store: Arc<dyn PrimaryStore>, cache: CacheAside, fut: F) -> F::Output
where
    F: Future,
{
    ACTIVE_LOADERS.scope(LoaderContext::new(store, cache), fut).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoopCacheStore;
    use crate::store::InMemoryStore;
    use crate::testing::make_user;

    fn fixtures() -> (Arc<InMemoryStore>, Arc<dyn PrimaryStore>, CacheAside) {
        let store = Arc::new(InMemoryStore::new());
        let as_trait: Arc<dyn PrimaryStore> = store.clone();
        let cache = CacheAside::new(Arc::new(NoopCacheStore::new()));
        (store, as_trait, cache)
    }

    #[tokio::test]
    async fn test_scope_shares_one_loader_set() {
        let (store, as_trait, cache) = fixtures();
        let ada = make_user("ada@example.com");
        store.insert_user(ada.clone());

        with_loader_scope(Arc::clone(&as_trait), cache.clone(), async {
            // Two call sites, each asking for "the current loaders".
            let first = LoaderContext::current(&as_trait, &cache);
            let second = LoaderContext::current(&as_trait, &cache);

            first.users.load(ada.user_id).await.expect("first site");
            second.users.load(ada.user_id).await.expect("second site");
        })
        .await;

        // Both sites resolved through the same memo: one store query.
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test]
    async fn test_scopes_do_not_share_memos() {
        let (store, as_trait, cache) = fixtures();
        let ada = make_user("ada@example.com");
        store.insert_user(ada.clone());

        for _ in 0..2 {
            with_loader_scope(Arc::clone(&as_trait), cache.clone(), async {
                let loaders = LoaderContext::current(&as_trait, &cache);
                loaders.users.load(ada.user_id).await.expect("read");
            })
            .await;
        }

        // A fresh scope means a fresh memo, so the store is asked again.
        assert_eq!(store.queries(), 2);
    }

    #[tokio::test]
    async fn test_unscoped_call_sites_still_work() {
        let (store, as_trait, cache) = fixtures();
        let ada = make_user("ada@example.com");
        store.insert_user(ada.clone());

        let first = LoaderContext::current(&as_trait, &cache);
        let second = LoaderContext::current(&as_trait, &cache);

        first.users.load(ada.user_id).await.expect("first");
        second.users.load(ada.user_id).await.expect("second");

        // Each one-off set stands alone: no cross-call batching.
        assert_eq!(store.queries(), 2);
    }

    #[tokio::test]
    async fn test_clear_all_forces_refetch_within_a_scope() {
        let (store, as_trait, cache) = fixtures();
        let ada = make_user("ada@example.com");
        store.insert_user(ada.clone());

        with_loader_scope(Arc::clone(&as_trait), cache.clone(), async {
            let loaders = LoaderContext::current(&as_trait, &cache);
            loaders.users.load(ada.user_id).await.expect("first");
            loaders.clear_all();
            loaders.users.load(ada.user_id).await.expect("after clear");
        })
        .await;

        assert_eq!(store.queries(), 2);
    }
}
