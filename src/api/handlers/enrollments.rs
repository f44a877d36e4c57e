//! Enrollment handlers

use crate::api::handlers::AppState;
use crate::api::models::EnrollmentResponse;
use crate::auth::middleware::AuthUser;
use crate::core::error::{LmsError, Result};
use crate::db::repository::Repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// POST /api/v1/courses/{id}/enroll
///
/// Enrolls the caller in a course. Re-enrolling is a no-op that returns
/// the existing record; 404 when the course does not exist.
pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<(StatusCode, Json<EnrollmentResponse>)> {
    state
        .course_repo
        .find_by_id(course_id)
        .await?
        .ok_or_else(|| LmsError::NotFound(format!("Course {} not found", course_id)))?;

    let enrollment = state.enrollment_repo.enroll(user.id, course_id).await?;

    tracing::info!(user_id = user.id, course_id, "Enrollment recorded");

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from(enrollment))))
}

/// GET /api/v1/enrollments
///
/// Lists the caller's enrollments with their aggregate progress.
pub async fn list_my_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<EnrollmentResponse>>> {
    let enrollments = state.enrollment_repo.find_by_user(user.id).await?;
    Ok(Json(
        enrollments
            .into_iter()
            .map(EnrollmentResponse::from)
            .collect(),
    ))
}
