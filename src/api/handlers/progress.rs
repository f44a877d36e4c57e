//! Lesson and module progress handlers

use crate::api::handlers::AppState;
use crate::api::models::{LessonProgressResponse, LessonProgressUpdate};
use crate::auth::middleware::AuthUser;
use crate::core::error::{LmsError, Result};
use crate::core::services::{ModuleProgress, ResetSummary};
use axum::{
    extract::{Path, State},
    Json,
};

/// PUT /api/v1/lessons/{id}/progress
///
/// Upserts the caller's progress on a lesson and recomputes the owning
/// enrollment's aggregate percentage.
pub async fn update_lesson_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(lesson_id): Path<i64>,
    Json(update): Json<LessonProgressUpdate>,
) -> Result<Json<LessonProgressResponse>> {
    let record = state
        .progress
        .set_lesson_progress(
            user.id,
            lesson_id,
            update.status,
            update.effective_percentage(),
        )
        .await?;

    Ok(Json(LessonProgressResponse::from(record)))
}

/// GET /api/v1/modules/{id}/progress
pub async fn get_module_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(module_id): Path<i64>,
) -> Result<Json<ModuleProgress>> {
    let progress = state.progress.module_progress(user.id, module_id).await?;
    Ok(Json(progress))
}

/// POST /api/v1/admin/progress/reset
///
/// Zeroes every enrollment and deletes all lesson progress. Admin only.
pub async fn reset_all_progress(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ResetSummary>> {
    if !user.is_admin() {
        return Err(LmsError::PermissionDenied(
            "Only administrators may reset progress".to_string(),
        ));
    }

    tracing::warn!(admin_id = user.id, "Bulk progress reset requested");

    let summary = state.progress.reset_all_progress().await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password;
    use crate::db::manager::DatabaseManager;
    use crate::db::models::{LessonStatus, UserRole};
    use crate::db::repository::NewUser;
    use std::sync::Arc;

    async fn test_state() -> AppState {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        db.execute(|conn| {
            conn.execute_batch(
                "INSERT INTO courses (title) VALUES ('Introduction to HIV');
                 INSERT INTO modules (course_id, title, sort_order) VALUES (1, 'Module 1', 1);
                 INSERT INTO lessons (module_id, title, sort_order, duration_minutes) VALUES (1, 'Lesson A', 1, 10);
                 INSERT INTO lessons (module_id, title, sort_order, duration_minutes) VALUES (1, 'Lesson B', 2, 12);",
            )
            .map_err(LmsError::DatabaseError)
        })
        .await
        .unwrap();
        AppState::new(db, "progress-test-secret".to_string(), 60)
    }

    async fn make_user(state: &AppState, email: &str, role: UserRole) -> AuthUser {
        let user = state
            .user_repo
            .create(NewUser {
                full_name: "Alex Johnson".to_string(),
                email: email.to_string(),
                password_hash: password::hash_password("student123").unwrap(),
                role,
            })
            .await
            .unwrap();
        AuthUser {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
        }
    }

    #[tokio::test]
    async fn test_update_and_read_module_progress() {
        let state = test_state().await;
        let user = make_user(&state, "alex@example.com", UserRole::Student).await;
        state.enrollment_repo.enroll(user.id, 1).await.unwrap();

        let Json(updated) = update_lesson_progress(
            State(state.clone()),
            user.clone(),
            Path(1),
            Json(LessonProgressUpdate {
                status: LessonStatus::Completed,
                progress_percentage: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, LessonStatus::Completed);
        assert_eq!(updated.progress_percentage, 100);
        assert!(updated.completed_at.is_some());

        let Json(module) = get_module_progress(State(state.clone()), user.clone(), Path(1))
            .await
            .unwrap();
        assert_eq!(module.total_lessons, 2);
        assert_eq!(module.completed_lessons, 1);
        assert_eq!(module.percentage, 50);

        // Enrollment aggregate tracked the lesson update
        let enrollment = state
            .enrollment_repo
            .find_by_user_and_course(user.id, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress_percentage, 50);
    }

    #[tokio::test]
    async fn test_progress_on_missing_lesson_is_not_found() {
        let state = test_state().await;
        let user = make_user(&state, "alex@example.com", UserRole::Student).await;

        let err = update_lesson_progress(
            State(state),
            user,
            Path(999),
            Json(LessonProgressUpdate {
                status: LessonStatus::InProgress,
                progress_percentage: Some(10),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LmsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_percentage_rejected() {
        let state = test_state().await;
        let user = make_user(&state, "alex@example.com", UserRole::Student).await;

        let err = update_lesson_progress(
            State(state),
            user,
            Path(1),
            Json(LessonProgressUpdate {
                status: LessonStatus::InProgress,
                progress_percentage: Some(150),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LmsError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_reset_requires_admin() {
        let state = test_state().await;
        let student = make_user(&state, "alex@example.com", UserRole::Student).await;

        let err = reset_all_progress(State(state), student).await.unwrap_err();
        assert!(matches!(err, LmsError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_admin_reset_clears_everything() {
        let state = test_state().await;
        let student = make_user(&state, "alex@example.com", UserRole::Student).await;
        let admin = make_user(&state, "admin@jijue.com", UserRole::Admin).await;

        state.enrollment_repo.enroll(student.id, 1).await.unwrap();
        update_lesson_progress(
            State(state.clone()),
            student.clone(),
            Path(1),
            Json(LessonProgressUpdate {
                status: LessonStatus::Completed,
                progress_percentage: None,
            }),
        )
        .await
        .unwrap();

        let Json(summary) = reset_all_progress(State(state.clone()), admin).await.unwrap();
        assert_eq!(summary.enrollments_reset, 1);
        assert_eq!(summary.progress_deleted, 1);

        let enrollment = state
            .enrollment_repo
            .find_by_user_and_course(student.id, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress_percentage, 0);
        assert!(enrollment.completed_at.is_none());
        assert_eq!(state.lesson_progress_repo.count().await.unwrap(), 0);
    }
}
