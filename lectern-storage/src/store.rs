//! Primary-store abstraction and in-memory implementation.
//!
//! The read contract the loaders and the cached client consume. The
//! production implementation lives with the database layer; this crate
//! only defines the trait and ships an in-memory implementation used by
//! tests and cache-less development setups.
//!
//! Bulk operations return rows aligned to the requested keys, with
//! `None` marking a key the store does not know. Implementations own
//! that alignment (a SQL implementation re-orders the rows of an `IN`
//! query before returning).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use lectern_core::{
    Category, CategoryId, Course, CourseDetail, CourseId, Enrollment, EnrollmentKey, Lesson,
    LessonId, LessonProgress, LiveSession, ProgressKey, SessionId, SiteSettings, StoreError,
    StoreResult, User, UserId,
};

/// Read contract against the primary relational store.
///
/// This layer has no knowledge of the store's query language; it only
/// names the lookups the batching and caching machinery needs.
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Get a user by ID.
    async fn user_get(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Bulk-get users, aligned to `ids`.
    async fn users_by_ids(&self, ids: &[UserId]) -> StoreResult<Vec<Option<User>>>;

    // ========================================================================
    // COURSE OPERATIONS
    // ========================================================================

    /// Get a course by ID.
    async fn course_get(&self, id: CourseId) -> StoreResult<Option<Course>>;

    /// Get the full course payload (course, lessons, category) by ID.
    async fn course_detail(&self, id: CourseId) -> StoreResult<Option<CourseDetail>>;

    /// Get a course by its URL slug.
    async fn course_by_slug(&self, slug: &str) -> StoreResult<Option<Course>>;

    /// List published courses for the catalog.
    async fn course_list(&self) -> StoreResult<Vec<Course>>;

    /// Bulk-get courses, aligned to `ids`.
    async fn courses_by_ids(&self, ids: &[CourseId]) -> StoreResult<Vec<Option<Course>>>;

    // ========================================================================
    // LESSON OPERATIONS
    // ========================================================================

    /// Get a lesson by ID.
    async fn lesson_get(&self, id: LessonId) -> StoreResult<Option<Lesson>>;

    /// Bulk-get lessons, aligned to `ids`.
    async fn lessons_by_ids(&self, ids: &[LessonId]) -> StoreResult<Vec<Option<Lesson>>>;

    /// List a course's lessons in position order.
    async fn lessons_by_course(&self, course_id: CourseId) -> StoreResult<Vec<Lesson>>;

    // ========================================================================
    // ENROLLMENT AND PROGRESS OPERATIONS
    // ========================================================================

    /// Get an enrollment by its (user, course) identity.
    async fn enrollment_get(&self, key: &EnrollmentKey) -> StoreResult<Option<Enrollment>>;

    /// Bulk-get enrollments, aligned to `keys`.
    async fn enrollments_by_keys(
        &self,
        keys: &[EnrollmentKey],
    ) -> StoreResult<Vec<Option<Enrollment>>>;

    /// Get a progress row by its (user, lesson) identity.
    async fn progress_get(&self, key: &ProgressKey) -> StoreResult<Option<LessonProgress>>;

    /// Bulk-get progress rows, aligned to `keys`.
    async fn progress_by_keys(
        &self,
        keys: &[ProgressKey],
    ) -> StoreResult<Vec<Option<LessonProgress>>>;

    // ========================================================================
    // CATALOG AND SITE OPERATIONS
    // ========================================================================

    /// Get a category by ID.
    async fn category_get(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    /// List categories in display order.
    async fn category_list(&self) -> StoreResult<Vec<Category>>;

    /// Get a live session by ID.
    async fn session_get(&self, id: SessionId) -> StoreResult<Option<LiveSession>>;

    /// Get the site-settings singleton.
    async fn site_settings(&self) -> StoreResult<Option<SiteSettings>>;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATION
// ============================================================================

/// In-memory `PrimaryStore` backed by `RwLock`-guarded maps.
///
/// Counts every trait call so tests can assert how many store queries a
/// read path actually issued.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    courses: RwLock<HashMap<CourseId, Course>>,
    lessons: RwLock<HashMap<LessonId, Lesson>>,
    enrollments: RwLock<HashMap<EnrollmentKey, Enrollment>>,
    progress: RwLock<HashMap<ProgressKey, LessonProgress>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
    sessions: RwLock<HashMap<SessionId, LiveSession>>,
    settings: RwLock<Option<SiteSettings>>,
    queries: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store queries issued so far.
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    // ------------------------------------------------------------------------
    // Seeding helpers (tests and development fixtures)
    // ------------------------------------------------------------------------

    pub fn insert_user(&self, user: User) {
        recover(self.users.write()).insert(user.user_id, user);
    }

    pub fn insert_course(&self, course: Course) {
        recover(self.courses.write()).insert(course.course_id, course);
    }

    pub fn insert_lesson(&self, lesson: Lesson) {
        recover(self.lessons.write()).insert(lesson.lesson_id, lesson);
    }

    pub fn insert_enrollment(&self, enrollment: Enrollment) {
        let key = EnrollmentKey::new(enrollment.user_id, enrollment.course_id);
        recover(self.enrollments.write()).insert(key, enrollment);
    }

    pub fn insert_progress(&self, progress: LessonProgress) {
        let key = ProgressKey::new(progress.user_id, progress.lesson_id);
        recover(self.progress.write()).insert(key, progress);
    }

    pub fn insert_category(&self, category: Category) {
        recover(self.categories.write()).insert(category.category_id, category);
    }

    pub fn insert_session(&self, session: LiveSession) {
        recover(self.sessions.write()).insert(session.session_id, session);
    }

    pub fn set_site_settings(&self, settings: SiteSettings) {
        *recover(self.settings.write()) = Some(settings);
    }
}

/// A poisoned map lock means a seeding call panicked mid-write; the data
/// is still plain `HashMap` state, so recover the guard instead of
/// wedging every read after a test failure.
fn recover<G>(result: Result<G, std::sync::PoisonError<G>>) -> G {
    result.unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl PrimaryStore for InMemoryStore {
    async fn user_get(&self, id: UserId) -> StoreResult<Option<User>> {
        self.record_query();
        Ok(recover(self.users.read()).get(&id).cloned())
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> StoreResult<Vec<Option<User>>> {
        self.record_query();
        let users = recover(self.users.read());
        Ok(ids.iter().map(|id| users.get(id).cloned()).collect())
    }

    async fn course_get(&self, id: CourseId) -> StoreResult<Option<Course>> {
        self.record_query();
        Ok(recover(self.courses.read()).get(&id).cloned())
    }

    async fn course_detail(&self, id: CourseId) -> StoreResult<Option<CourseDetail>> {
        self.record_query();
        let course = match recover(self.courses.read()).get(&id).cloned() {
            Some(course) => course,
            None => return Ok(None),
        };

        let mut lessons: Vec<Lesson> = recover(self.lessons.read())
            .values()
            .filter(|l| l.course_id == id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.position);

        let category = course
            .category_id
            .and_then(|cid| recover(self.categories.read()).get(&cid).cloned());

        Ok(Some(CourseDetail {
            course,
            lessons,
            category,
        }))
    }

    async fn course_by_slug(&self, slug: &str) -> StoreResult<Option<Course>> {
        self.record_query();
        Ok(recover(self.courses.read())
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn course_list(&self) -> StoreResult<Vec<Course>> {
        self.record_query();
        let mut courses: Vec<Course> = recover(self.courses.read())
            .values()
            .filter(|c| c.published)
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(courses)
    }

    async fn courses_by_ids(&self, ids: &[CourseId]) -> StoreResult<Vec<Option<Course>>> {
        self.record_query();
        let courses = recover(self.courses.read());
        Ok(ids.iter().map(|id| courses.get(id).cloned()).collect())
    }

    async fn lesson_get(&self, id: LessonId) -> StoreResult<Option<Lesson>> {
        self.record_query();
        Ok(recover(self.lessons.read()).get(&id).cloned())
    }

    async fn lessons_by_ids(&self, ids: &[LessonId]) -> StoreResult<Vec<Option<Lesson>>> {
        self.record_query();
        let lessons = recover(self.lessons.read());
        Ok(ids.iter().map(|id| lessons.get(id).cloned()).collect())
    }

    async fn lessons_by_course(&self, course_id: CourseId) -> StoreResult<Vec<Lesson>> {
        self.record_query();
        let mut lessons: Vec<Lesson> = recover(self.lessons.read())
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.position);
        Ok(lessons)
    }

    async fn enrollment_get(&self, key: &EnrollmentKey) -> StoreResult<Option<Enrollment>> {
        self.record_query();
        Ok(recover(self.enrollments.read()).get(key).cloned())
    }

    async fn enrollments_by_keys(
        &self,
        keys: &[EnrollmentKey],
    ) -> StoreResult<Vec<Option<Enrollment>>> {
        self.record_query();
        let enrollments = recover(self.enrollments.read());
        Ok(keys.iter().map(|k| enrollments.get(k).cloned()).collect())
    }

    async fn progress_get(&self, key: &ProgressKey) -> StoreResult<Option<LessonProgress>> {
        self.record_query();
        Ok(recover(self.progress.read()).get(key).cloned())
    }

    async fn progress_by_keys(
        &self,
        keys: &[ProgressKey],
    ) -> StoreResult<Vec<Option<LessonProgress>>> {
        self.record_query();
        let progress = recover(self.progress.read());
        Ok(keys.iter().map(|k| progress.get(k).cloned()).collect())
    }

    async fn category_get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        self.record_query();
        Ok(recover(self.categories.read()).get(&id).cloned())
    }

    async fn category_list(&self) -> StoreResult<Vec<Category>> {
        self.record_query();
        let mut categories: Vec<Category> =
            recover(self.categories.read()).values().cloned().collect();
        categories.sort_by_key(|c| c.position);
        Ok(categories)
    }

    async fn session_get(&self, id: SessionId) -> StoreResult<Option<LiveSession>> {
        self.record_query();
        Ok(recover(self.sessions.read()).get(&id).cloned())
    }

    async fn site_settings(&self) -> StoreResult<Option<SiteSettings>> {
        self.record_query();
        Ok(recover(self.settings.read()).clone())
    }
}

/// Always-failing store used to test error propagation through the
/// loaders and the cache engine.
pub struct FailingStore {
    error: StoreError,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl PrimaryStore for FailingStore {
    async fn user_get(&self, _id: UserId) -> StoreResult<Option<User>> {
        Err(self.error.clone())
    }

    async fn users_by_ids(&self, _ids: &[UserId]) -> StoreResult<Vec<Option<User>>> {
        Err(self.error.clone())
    }

    async fn course_get(&self, _id: CourseId) -> StoreResult<Option<Course>> {
        Err(self.error.clone())
    }

    async fn course_detail(&self, _id: CourseId) -> StoreResult<Option<CourseDetail>> {
        Err(self.error.clone())
    }

    async fn course_by_slug(&self, _slug: &str) -> StoreResult<Option<Course>> {
        Err(self.error.clone())
    }

    async fn course_list(&self) -> StoreResult<Vec<Course>> {
        Err(self.error.clone())
    }

    async fn courses_by_ids(&self, _ids: &[CourseId]) -> StoreResult<Vec<Option<Course>>> {
        Err(self.error.clone())
    }

    async fn lesson_get(&self, _id: LessonId) -> StoreResult<Option<Lesson>> {
        Err(self.error.clone())
    }

    async fn lessons_by_ids(&self, _ids: &[LessonId]) -> StoreResult<Vec<Option<Lesson>>> {
        Err(self.error.clone())
    }

    async fn lessons_by_course(&self, _course_id: CourseId) -> StoreResult<Vec<Lesson>> {
        Err(self.error.clone())
    }

    async fn enrollment_get(&self, _key: &EnrollmentKey) -> StoreResult<Option<Enrollment>> {
        Err(self.error.clone())
    }

    async fn enrollments_by_keys(
        &self,
        _keys: &[EnrollmentKey],
    ) -> StoreResult<Vec<Option<Enrollment>>> {
        Err(self.error.clone())
    }

    async fn progress_get(&self, _key: &ProgressKey) -> StoreResult<Option<LessonProgress>> {
        Err(self.error.clone())
    }

    async fn progress_by_keys(
        &self,
        _keys: &[ProgressKey],
    ) -> StoreResult<Vec<Option<LessonProgress>>> {
        Err(self.error.clone())
    }

    async fn category_get(&self, _id: CategoryId) -> StoreResult<Option<Category>> {
        Err(self.error.clone())
    }

    async fn category_list(&self) -> StoreResult<Vec<Category>> {
        Err(self.error.clone())
    }

    async fn session_get(&self, _id: SessionId) -> StoreResult<Option<LiveSession>> {
        Err(self.error.clone())
    }

    async fn site_settings(&self) -> StoreResult<Option<SiteSettings>> {
        Err(self.error.clone())
    }
}
