//! Identity types for Lectern entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a new UUIDv7 (timestamp-sortable) identifier value.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub fn new_entity_id() -> Uuid {
    Uuid::now_v7()
}

/// Declares a transparent UUID newtype for one entity family.
///
/// Keeping each identifier a distinct type means a `UserId` can never be
/// passed where a `CourseId` is expected, which matters once identifiers
/// start flowing through generic loaders and cache keys.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh timestamp-sortable identifier.
            pub fn generate() -> Self {
                Self(new_entity_id())
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of a platform user (student, instructor, or admin).
    UserId
);
entity_id!(
    /// Identifier of a course.
    CourseId
);
entity_id!(
    /// Identifier of a lesson within a course.
    LessonId
);
entity_id!(
    /// Identifier of an enrollment row.
    EnrollmentId
);
entity_id!(
    /// Identifier of a lesson-progress row.
    ProgressId
);
entity_id!(
    /// Identifier of a course category.
    CategoryId
);
entity_id!(
    /// Identifier of a scheduled live session.
    SessionId
);

/// Composite identity of an enrollment: one user in one course.
///
/// Enrollments are addressed by the pair rather than by their row id,
/// both in bulk lookups and in cache keys. `Display` renders the
/// canonical `"{user}:{course}"` form used in the cache keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentKey {
    pub user_id: UserId,
    pub course_id: CourseId,
}

impl EnrollmentKey {
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self { user_id, course_id }
    }
}

impl fmt::Display for EnrollmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.course_id)
    }
}

/// Composite identity of a lesson-progress row: one user on one lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    pub user_id: UserId,
    pub lesson_id: LessonId,
}

impl ProgressKey {
    pub fn new(user_id: UserId, lesson_id: LessonId) -> Self {
        Self { user_id, lesson_id }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.lesson_id)
    }
}
