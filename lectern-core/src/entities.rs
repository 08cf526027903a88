//! Core entity structures
//!
//! These are the read models the data-access layer caches and batch-loads.
//! The source of truth for all of them is the primary relational store;
//! nothing in this crate creates or mutates them.

use crate::{
    CategoryId, CourseId, CourseLevel, EnrollmentId, EnrollmentStatus, LessonId, ProgressId,
    SessionId, SessionStatus, Timestamp, UserId, UserRole,
};
use serde::{Deserialize, Serialize};

/// A platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A course as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: CourseId,
    pub title: String,
    /// URL-stable identifier, unique across courses.
    pub slug: String,
    pub description: Option<String>,
    pub instructor_id: UserId,
    pub category_id: Option<CategoryId>,
    pub level: CourseLevel,
    pub price_cents: i64,
    pub published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub metadata: Option<serde_json::Value>,
}

/// The "full" course payload: the course together with its lessons and
/// category, assembled for the course page in one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDetail {
    pub course: Course,
    pub lessons: Vec<Lesson>,
    pub category: Option<Category>,
}

/// A lesson within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    /// Ordering within the course, starting at 1.
    pub position: i32,
    pub duration_secs: i64,
    pub video_url: Option<String>,
    /// Whether the lesson is viewable without enrollment.
    pub preview: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One user's membership in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub enrolled_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub metadata: Option<serde_json::Value>,
}

/// One user's progress on one lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub progress_id: ProgressId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub completed: bool,
    pub seconds_watched: i64,
    pub updated_at: Timestamp,
}

/// A course category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub position: i32,
}

/// A scheduled live session attached to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSession {
    pub session_id: SessionId,
    pub course_id: CourseId,
    pub title: String,
    pub starts_at: Timestamp,
    pub duration_mins: i32,
    pub join_url: Option<String>,
    pub status: SessionStatus,
}

/// Site-wide settings, a singleton row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub site_name: String,
    pub support_email: String,
    pub currency: String,
    pub maintenance_mode: bool,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_course() -> Course {
        Course {
            course_id: CourseId::generate(),
            title: "Intro to Sourdough".to_string(),
            slug: "intro-to-sourdough".to_string(),
            description: None,
            instructor_id: UserId::generate(),
            category_id: None,
            level: CourseLevel::Beginner,
            price_cents: 4900,
            published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            metadata: None,
        }
    }

    #[test]
    fn test_course_serde_roundtrip() {
        let course = make_course();
        let json = serde_json::to_string(&course).expect("serialize");
        let back: Course = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, course);
    }

    #[test]
    fn test_course_detail_embeds_lessons() {
        let course = make_course();
        let lesson = Lesson {
            lesson_id: LessonId::generate(),
            course_id: course.course_id,
            title: "Starter basics".to_string(),
            position: 1,
            duration_secs: 540,
            video_url: None,
            preview: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let detail = CourseDetail {
            course: course.clone(),
            lessons: vec![lesson],
            category: None,
        };

        let json = serde_json::to_string(&detail).expect("serialize");
        let back: CourseDetail = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.course.course_id, course.course_id);
        assert_eq!(back.lessons.len(), 1);
    }
}
