//! Lectern Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;

pub use config::CacheSettings;
pub use entities::{
    Category, Course, CourseDetail, Enrollment, Lesson, LessonProgress, LiveSession, SiteSettings,
    User,
};
pub use enums::{CourseLevel, EnrollmentStatus, EntityKind, SessionStatus, UserRole};
pub use error::{ConfigError, LecternError, LecternResult, LoadError, StoreError, StoreResult};
pub use identity::{
    new_entity_id, CategoryId, CourseId, EnrollmentId, EnrollmentKey, LessonId, ProgressId,
    ProgressKey, SessionId, Timestamp, UserId,
};
