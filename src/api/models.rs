//! API response and request types for the catalog and progress endpoints

use crate::db::models::{Course, Enrollment, Lesson, LessonProgress, LessonStatus, Module};
use crate::db::repository::CourseDetail;
use serde::{Deserialize, Serialize};

/// Catalog listing entry: course metadata without its contents
#[derive(Debug, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub color: String,
}

impl From<Course> for CourseSummary {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            category: course.category,
            icon: course.icon,
            color: course.color,
        }
    }
}

/// A lesson as it appears inside a course detail response
#[derive(Debug, Serialize, Deserialize)]
pub struct LessonResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub sort_order: i64,
    pub duration_minutes: i64,
}

impl From<Lesson> for LessonResponse {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title,
            description: lesson.description,
            content: lesson.content,
            sort_order: lesson.sort_order,
            duration_minutes: lesson.duration_minutes,
        }
    }
}

/// A module with its lessons, as it appears inside a course detail response
#[derive(Debug, Serialize, Deserialize)]
pub struct ModuleResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub sort_order: i64,
    pub lessons: Vec<LessonResponse>,
}

impl ModuleResponse {
    fn from_parts(module: Module, lessons: Vec<Lesson>) -> Self {
        Self {
            id: module.id,
            title: module.title,
            description: module.description,
            sort_order: module.sort_order,
            lessons: lessons.into_iter().map(LessonResponse::from).collect(),
        }
    }
}

/// Full course contents: metadata plus ordered modules and lessons
#[derive(Debug, Serialize, Deserialize)]
pub struct CourseDetailResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub color: String,
    pub modules: Vec<ModuleResponse>,
}

impl From<CourseDetail> for CourseDetailResponse {
    fn from(detail: CourseDetail) -> Self {
        Self {
            id: detail.course.id,
            title: detail.course.title,
            description: detail.course.description,
            category: detail.course.category,
            icon: detail.course.icon,
            color: detail.course.color,
            modules: detail
                .modules
                .into_iter()
                .map(|(module, lessons)| ModuleResponse::from_parts(module, lessons))
                .collect(),
        }
    }
}

/// One of the caller's enrollments
#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollmentResponse {
    pub id: i64,
    pub course_id: i64,
    pub enrolled_at: String,
    pub completed_at: Option<String>,
    pub progress_percentage: i64,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            course_id: enrollment.course_id,
            enrolled_at: enrollment.enrolled_at,
            completed_at: enrollment.completed_at,
            progress_percentage: enrollment.progress_percentage,
        }
    }
}

/// Body of PUT /lessons/{id}/progress
#[derive(Debug, Deserialize)]
pub struct LessonProgressUpdate {
    pub status: LessonStatus,
    pub progress_percentage: Option<i64>,
}

impl LessonProgressUpdate {
    /// Omitted percentage follows the status: 100 when completed, else 0
    pub fn effective_percentage(&self) -> i64 {
        self.progress_percentage.unwrap_or(match self.status {
            LessonStatus::Completed => 100,
            _ => 0,
        })
    }
}

/// State of one lesson for the caller after an update
#[derive(Debug, Serialize, Deserialize)]
pub struct LessonProgressResponse {
    pub lesson_id: i64,
    pub status: LessonStatus,
    pub progress_percentage: i64,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

impl From<LessonProgress> for LessonProgressResponse {
    fn from(progress: LessonProgress) -> Self {
        Self {
            lesson_id: progress.lesson_id,
            status: progress.status,
            progress_percentage: progress.progress_percentage,
            started_at: progress.started_at,
            completed_at: progress.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_detail_response_shape() {
        let detail = CourseDetail {
            course: Course {
                id: 1,
                title: "Introduction to HIV".to_string(),
                description: Some("Basics".to_string()),
                category: Some("HIV Basics".to_string()),
                icon: None,
                color: "#FF5733".to_string(),
                created_at: "2024-01-01T00:00:00Z".to_string(),
                updated_at: "2024-01-01T00:00:00Z".to_string(),
            },
            modules: vec![(
                Module {
                    id: 10,
                    course_id: 1,
                    title: "Module 1".to_string(),
                    description: None,
                    sort_order: 1,
                    created_at: "2024-01-01T00:00:00Z".to_string(),
                    updated_at: "2024-01-01T00:00:00Z".to_string(),
                },
                vec![Lesson {
                    id: 100,
                    module_id: 10,
                    title: "Lesson A".to_string(),
                    description: None,
                    content: Some("https://example.com/video.mp4".to_string()),
                    sort_order: 1,
                    duration_minutes: 12,
                    created_at: "2024-01-01T00:00:00Z".to_string(),
                    updated_at: "2024-01-01T00:00:00Z".to_string(),
                }],
            )],
        };

        let response = CourseDetailResponse::from(detail);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["modules"][0]["lessons"][0]["title"], "Lesson A");
        assert_eq!(json["modules"][0]["lessons"][0]["duration_minutes"], 12);
    }

    #[test]
    fn test_progress_update_defaults_follow_status() {
        let update: LessonProgressUpdate =
            serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert_eq!(update.status, LessonStatus::Completed);
        assert_eq!(update.effective_percentage(), 100);

        let update: LessonProgressUpdate =
            serde_json::from_str(r#"{"status": "in_progress"}"#).unwrap();
        assert_eq!(update.effective_percentage(), 0);

        let update: LessonProgressUpdate =
            serde_json::from_str(r#"{"status": "in_progress", "progress_percentage": 40}"#)
                .unwrap();
        assert_eq!(update.effective_percentage(), 40);
    }
}
