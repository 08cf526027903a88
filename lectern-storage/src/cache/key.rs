//! Cache keyspace
//!
//! Every cache entry lives under a fixed prefix from [`KeyPrefix`], and
//! keys render as `{prefix}:{part}[:{part}...]`. A key is a pure
//! function of the identifying fields: the same logical lookup always
//! produces the same string, so the constructors here are the only
//! place key strings are ever assembled. Call sites never concatenate
//! key fragments by hand.

use lectern_core::{CategoryId, CourseId, EnrollmentKey, LessonId, ProgressKey, SessionId, UserId};
use std::fmt;

/// Separator between key parts.
const SEPARATOR: char = ':';

/// Fixed prefix namespace for cache keys.
///
/// Two unrelated entities must never share a prefix; collisions are a
/// caller error this layer does not detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPrefix {
    User,
    Session,
    Course,
    Lesson,
    Enrollment,
    SiteSettings,
    CourseList,
    Category,
    Progress,
}

impl KeyPrefix {
    /// The wire form of the prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyPrefix::User => "user",
            KeyPrefix::Session => "session",
            KeyPrefix::Course => "course",
            KeyPrefix::Lesson => "lesson",
            KeyPrefix::Enrollment => "enrollment",
            KeyPrefix::SiteSettings => "site-settings",
            KeyPrefix::CourseList => "course-list",
            KeyPrefix::Category => "category",
            KeyPrefix::Progress => "progress",
        }
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-rendered cache key.
///
/// Constructed on demand at each call site and rendered eagerly; the
/// rendered string is what the remote store sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    prefix: KeyPrefix,
    rendered: String,
}

impl CacheKey {
    fn build(prefix: KeyPrefix, parts: &[&dyn fmt::Display]) -> Self {
        let mut rendered = prefix.as_str().to_string();
        for part in parts {
            rendered.push(SEPARATOR);
            rendered.push_str(&part.to_string());
        }
        Self { prefix, rendered }
    }

    /// The prefix this key lives under.
    pub fn prefix(&self) -> KeyPrefix {
        self.prefix
    }

    /// The rendered key string.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    // ------------------------------------------------------------------------
    // Concrete key shapes
    // ------------------------------------------------------------------------

    /// `user:{id}`
    pub fn user(id: UserId) -> Self {
        Self::build(KeyPrefix::User, &[&id])
    }

    /// `session:{id}`
    pub fn session(id: SessionId) -> Self {
        Self::build(KeyPrefix::Session, &[&id])
    }

    /// `course:{id}`
    pub fn course(id: CourseId) -> Self {
        Self::build(KeyPrefix::Course, &[&id])
    }

    /// `course:{id}:full` - the course page payload with lessons embedded.
    pub fn course_full(id: CourseId) -> Self {
        Self::build(KeyPrefix::Course, &[&id, &"full"])
    }

    /// `course:slug:{slug}`
    pub fn course_slug(slug: &str) -> Self {
        Self::build(KeyPrefix::Course, &[&"slug", &slug])
    }

    /// `course-list:all` - the aggregate catalog listing.
    pub fn course_list() -> Self {
        Self::build(KeyPrefix::CourseList, &[&"all"])
    }

    /// `lesson:{lesson}:{course}`
    pub fn lesson(lesson_id: LessonId, course_id: CourseId) -> Self {
        Self::build(KeyPrefix::Lesson, &[&lesson_id, &course_id])
    }

    /// `lesson:course:{course}` - all lessons of one course.
    pub fn lessons_of_course(course_id: CourseId) -> Self {
        Self::build(KeyPrefix::Lesson, &[&"course", &course_id])
    }

    /// `enrollment:{user}:{course}`
    pub fn enrollment(key: &EnrollmentKey) -> Self {
        Self::build(KeyPrefix::Enrollment, &[&key.user_id, &key.course_id])
    }

    /// `progress:{user}:{lesson}`
    pub fn progress(key: &ProgressKey) -> Self {
        Self::build(KeyPrefix::Progress, &[&key.user_id, &key.lesson_id])
    }

    /// `category:{id}`
    pub fn category(id: CategoryId) -> Self {
        Self::build(KeyPrefix::Category, &[&id])
    }

    /// `category:list`
    pub fn category_list() -> Self {
        Self::build(KeyPrefix::Category, &[&"list"])
    }

    /// `site-settings:current` - the singleton settings row.
    pub fn site_settings() -> Self {
        Self::build(KeyPrefix::SiteSettings, &[&"current"])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Glob patterns used by entity-scoped invalidation.
///
/// Patterns use `*` as the only wildcard, matching any run of
/// characters, which is the subset the remote store's `SCAN MATCH`
/// understands the same way our in-memory matcher does.
pub struct KeyPattern;

impl KeyPattern {
    /// Every enrollment entry for one user: `enrollment:{user}:*`.
    pub fn user_enrollments(user_id: UserId) -> String {
        format!("{}:{}:*", KeyPrefix::Enrollment, user_id)
    }

    /// Every progress entry for one user: `progress:{user}:*`.
    pub fn user_progress(user_id: UserId) -> String {
        format!("{}:{}:*", KeyPrefix::Progress, user_id)
    }

    /// Every per-lesson entry under one course: `lesson:*:{course}`.
    pub fn course_lessons(course_id: CourseId) -> String {
        format!("{}:*:{}", KeyPrefix::Lesson, course_id)
    }

    /// Every enrollment entry for one course: `enrollment:*:{course}`.
    pub fn course_enrollments(course_id: CourseId) -> String {
        format!("{}:*:{}", KeyPrefix::Enrollment, course_id)
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn uuid_strategy() -> impl Strategy<Value = uuid::Uuid> {
        any::<[u8; 16]>().prop_map(uuid::Uuid::from_bytes)
    }

    proptest! {
        /// Same identifying fields always render the same key.
        #[test]
        fn prop_keys_are_deterministic(raw in uuid_strategy()) {
            let a = CacheKey::user(UserId::new(raw));
            let b = CacheKey::user(UserId::new(raw));
            prop_assert_eq!(a, b);
        }

        /// Different ids never collide within a prefix.
        #[test]
        fn prop_distinct_ids_distinct_keys(a in uuid_strategy(), b in uuid_strategy()) {
            prop_assume!(a != b);
            prop_assert_ne!(
                CacheKey::course(CourseId::new(a)),
                CacheKey::course(CourseId::new(b))
            );
        }

        /// A key always starts with its prefix followed by the separator.
        #[test]
        fn prop_key_starts_with_prefix(raw in uuid_strategy()) {
            let key = CacheKey::progress(&lectern_core::ProgressKey::new(
                UserId::new(raw),
                LessonId::new(raw),
            ));
            prop_assert!(key.as_str().starts_with("progress:"));
        }

        /// The user-scoped invalidation pattern matches exactly the keys
        /// built for that user and no other user's.
        #[test]
        fn prop_user_pattern_scopes_to_owner(a in uuid_strategy(), b in uuid_strategy()) {
            prop_assume!(a != b);
            let owner = UserId::new(a);
            let other = UserId::new(b);
            let course = CourseId::new(b);

            let pattern = KeyPattern::user_enrollments(owner);
            let owned = CacheKey::enrollment(&EnrollmentKey::new(owner, course));
            let unowned = CacheKey::enrollment(&EnrollmentKey::new(other, course));

            prop_assert!(crate::cache::memory::glob_match(&pattern, owned.as_str()));
            prop_assert!(!crate::cache::memory::glob_match(&pattern, unowned.as_str()));
        }
    }
}
