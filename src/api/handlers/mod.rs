//! HTTP request handlers
//!
//! Handlers stay thin: extract, delegate to repositories or services,
//! shape the response. Business rules live in the core layer.

pub mod courses;
pub mod enrollments;
pub mod progress;

use crate::core::services::ProgressService;
use crate::db::manager::DatabaseManager;
use crate::db::repository::{
    CourseRepository, EnrollmentRepository, LessonProgressRepository, UserRepository,
};
use std::sync::Arc;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<UserRepository>,
    pub course_repo: Arc<CourseRepository>,
    pub enrollment_repo: Arc<EnrollmentRepository>,
    pub lesson_progress_repo: Arc<LessonProgressRepository>,
    pub progress: Arc<ProgressService>,
    pub jwt_secret: Arc<String>,
    pub token_ttl_minutes: i64,
}

impl AppState {
    /// Wire up repositories and services over one database manager
    pub fn new(db: Arc<DatabaseManager>, jwt_secret: String, token_ttl_minutes: i64) -> Self {
        let user_repo = Arc::new(UserRepository::new(db.clone()));
        let course_repo = Arc::new(CourseRepository::new(db.clone()));
        let enrollment_repo = Arc::new(EnrollmentRepository::new(db.clone()));
        let lesson_progress_repo = Arc::new(LessonProgressRepository::new(db.clone()));
        let progress = Arc::new(ProgressService::new(
            db,
            course_repo.clone(),
            enrollment_repo.clone(),
            lesson_progress_repo.clone(),
        ));

        Self {
            user_repo,
            course_repo,
            enrollment_repo,
            lesson_progress_repo,
            progress,
            jwt_secret: Arc::new(jwt_secret),
            token_ttl_minutes,
        }
    }
}
