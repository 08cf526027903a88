//! Shared fixture builders for this crate's tests.

use chrono::Utc;
use lectern_core::{
    Category, CategoryId, Course, CourseId, CourseLevel, Enrollment, EnrollmentId,
    EnrollmentStatus, Lesson, LessonId, LessonProgress, LiveSession, ProgressId, SessionId,
    SessionStatus, SiteSettings, User, UserId, UserRole,
};

pub fn make_user(email: &str) -> User {
    User {
        user_id: UserId::generate(),
        email: email.to_string(),
        name: email.split('@').next().unwrap_or("user").to_string(),
        role: UserRole::Student,
        avatar_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn make_course(slug: &str) -> Course {
    Course {
        course_id: CourseId::generate(),
        title: slug.replace('-', " "),
        slug: slug.to_string(),
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

pub fn make_lesson(course_id: CourseId, position: i32) -> Lesson {
    Lesson {
        lesson_id: LessonId::generate(),
        course_id,
        title: format!("Lesson {position}"),
        position,
        duration_secs: 600,
        video_url: None,
        preview: position == 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn make_enrollment(user_id: UserId, course_id: CourseId) -> Enrollment {
    Enrollment {
        enrollment_id: EnrollmentId::generate(),
        user_id,
        course_id,
        status: EnrollmentStatus::Active,
        enrolled_at: Utc::now(),
        completed_at: None,
        metadata: None,
    }
}

pub fn make_progress(user_id: UserId, lesson_id: LessonId, course_id: CourseId) -> LessonProgress {
    LessonProgress {
        progress_id: ProgressId::generate(),
        user_id,
        lesson_id,
        course_id,
        completed: false,
        seconds_watched: 0,
        updated_at: Utc::now(),
    }
}

pub fn make_category(position: i32) -> Category {
    Category {
        category_id: CategoryId::generate(),
        name: format!("Category {position}"),
        slug: format!("category-{position}"),
        position,
    }
}

pub fn make_session(course_id: CourseId) -> LiveSession {
    LiveSession {
        session_id: SessionId::generate(),
        course_id,
        title: "Office hours".to_string(),
        starts_at: Utc::now(),
        duration_mins: 60,
        join_url: None,
        status: SessionStatus::Scheduled,
    }
}

pub fn make_settings() -> SiteSettings {
    SiteSettings {
        site_name: "Lectern".to_string(),
        support_email: "support@lectern.dev".to_string(),
        currency: "USD".to_string(),
        maintenance_mode: false,
        updated_at: Utc::now(),
    }
}
