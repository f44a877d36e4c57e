//! Business logic services
//!
//! ProgressService owns everything around lesson and course progress:
//! upsert semantics with timestamp transitions, per-module aggregation, the
//! automatic enrollment-percentage derivation, and the administrative bulk
//! reset.

use crate::core::error::{LmsError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{LessonProgress, LessonStatus};
use crate::db::repository::{
    CourseRepository, EnrollmentRepository, LessonProgressRepository,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Aggregated progress over one module for one user
#[derive(Debug, Clone, Serialize)]
pub struct ModuleProgress {
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub percentage: i64,
}

/// Counts removed by a bulk progress reset
#[derive(Debug, Clone, Serialize)]
pub struct ResetSummary {
    pub enrollments_reset: i64,
    pub progress_deleted: i64,
}

/// percentage = round(100 * completed / total), 0 for an empty set
fn completion_percentage(completed: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as i64
}

/// Progress tracking service
pub struct ProgressService {
    db: Arc<DatabaseManager>,
    courses: Arc<CourseRepository>,
    enrollments: Arc<EnrollmentRepository>,
    lesson_progress: Arc<LessonProgressRepository>,
}

impl ProgressService {
    pub fn new(
        db: Arc<DatabaseManager>,
        courses: Arc<CourseRepository>,
        enrollments: Arc<EnrollmentRepository>,
        lesson_progress: Arc<LessonProgressRepository>,
    ) -> Self {
        Self {
            db,
            courses,
            enrollments,
            lesson_progress,
        }
    }

    /// Upsert the progress row for (user, lesson).
    ///
    /// started_at is set on the first transition away from not_started and
    /// never cleared; completed_at is set on the transition to completed.
    /// Afterwards the owning enrollment's aggregate percentage is recomputed
    /// from the user's lesson_progress rows for that course.
    pub async fn set_lesson_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
        status: LessonStatus,
        percentage: i64,
    ) -> Result<LessonProgress> {
        if !(0..=100).contains(&percentage) {
            return Err(LmsError::InvalidRequest(format!(
                "progress_percentage must be between 0 and 100, got {}",
                percentage
            )));
        }

        let lesson = self
            .courses
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| LmsError::NotFound(format!("Lesson {} not found", lesson_id)))?;

        let existing = self.lesson_progress.find(user_id, lesson_id).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let started_at = match (&existing, status) {
            (Some(prior), _) if prior.started_at.is_some() => prior.started_at.clone(),
            (_, LessonStatus::NotStarted) => None,
            _ => Some(now.clone()),
        };

        let completed_at = match (&existing, status) {
            (Some(prior), _) if prior.completed_at.is_some() => prior.completed_at.clone(),
            (_, LessonStatus::Completed) => Some(now.clone()),
            _ => None,
        };

        let record = self
            .lesson_progress
            .upsert(user_id, lesson_id, status, percentage, started_at, completed_at)
            .await?;

        info!(
            user_id,
            lesson_id,
            status = %status,
            percentage,
            "Lesson progress updated"
        );

        // Derive the enrollment aggregate from lesson_progress rows so the
        // two never drift apart.
        if let Some(course_id) = self.courses.course_of_lesson(lesson.id).await? {
            self.sync_enrollment_progress(user_id, course_id).await?;
        }

        Ok(record)
    }

    /// Recompute one enrollment's percentage from its lesson_progress rows.
    /// A user who is not enrolled in the course is left untouched.
    async fn sync_enrollment_progress(&self, user_id: i64, course_id: i64) -> Result<()> {
        let Some(enrollment) = self
            .enrollments
            .find_by_user_and_course(user_id, course_id)
            .await?
        else {
            return Ok(());
        };

        let (total, completed) = self.lesson_progress.course_counts(user_id, course_id).await?;
        let percentage = completion_percentage(completed, total);
        let completed_at = if total > 0 && completed == total {
            // Keep the original completion instant across later updates
            enrollment
                .completed_at
                .or_else(|| Some(chrono::Utc::now().to_rfc3339()))
        } else {
            None
        };

        self.enrollments
            .set_progress(user_id, course_id, percentage, completed_at)
            .await
    }

    /// Aggregate one user's progress over a module's lessons
    pub async fn module_progress(&self, user_id: i64, module_id: i64) -> Result<ModuleProgress> {
        self.courses
            .find_module(module_id)
            .await?
            .ok_or_else(|| LmsError::NotFound(format!("Module {} not found", module_id)))?;

        let (total, completed) = self.lesson_progress.module_counts(user_id, module_id).await?;

        Ok(ModuleProgress {
            total_lessons: total,
            completed_lessons: completed,
            percentage: completion_percentage(completed, total),
        })
    }

    /// Administrative bulk reset: zero every enrollment and delete all
    /// lesson_progress rows in one transaction. Irreversible.
    pub async fn reset_all_progress(&self) -> Result<ResetSummary> {
        let summary = self
            .db
            .transaction(|tx| {
                let enrollments_reset = tx
                    .execute(
                        "UPDATE enrollments SET progress_percentage = 0, completed_at = NULL",
                        [],
                    )
                    .map_err(LmsError::DatabaseError)? as i64;

                let progress_deleted = tx
                    .execute("DELETE FROM lesson_progress", [])
                    .map_err(LmsError::DatabaseError)? as i64;

                Ok(ResetSummary {
                    enrollments_reset,
                    progress_deleted,
                })
            })
            .await?;

        info!(
            enrollments_reset = summary.enrollments_reset,
            progress_deleted = summary.progress_deleted,
            "All user progress reset"
        );

        Ok(summary)
    }
}
