//! Shared enumerations

use serde::{Deserialize, Serialize};

/// Entity kind discriminator used in errors and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Course,
    Lesson,
    Enrollment,
    Progress,
    Category,
    LiveSession,
    SiteSettings,
}

/// Role of a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

/// Difficulty level advertised on a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Lifecycle state of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

/// Lifecycle state of a scheduled live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Live,
    Ended,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&UserRole::Instructor).expect("serialize"),
            "\"instructor\""
        );
        assert_eq!(
            serde_json::to_string(&EnrollmentStatus::Cancelled).expect("serialize"),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_session_status_roundtrip() {
        for status in [
            SessionStatus::Scheduled,
            SessionStatus::Live,
            SessionStatus::Ended,
        ] {
            let json = serde_json::to_string(&status).expect("serialize");
            let back: SessionStatus = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, status);
        }
    }
}
