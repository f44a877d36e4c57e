//! Course catalog handlers

use crate::api::handlers::AppState;
use crate::api::models::{CourseDetailResponse, CourseSummary};
use crate::core::error::{LmsError, Result};
use crate::db::repository::Repository;
use axum::{
    extract::{Path, State},
    Json,
};

/// GET /api/v1/courses
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<CourseSummary>>> {
    let courses = state.course_repo.find_all().await?;
    Ok(Json(courses.into_iter().map(CourseSummary::from).collect()))
}

/// GET /api/v1/courses/{id}
///
/// Returns the course with its modules and lessons nested, siblings in
/// sort_order. 404 when the course does not exist.
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseDetailResponse>> {
    let detail = state
        .course_repo
        .find_detail(course_id)
        .await?
        .ok_or_else(|| LmsError::NotFound(format!("Course {} not found", course_id)))?;

    Ok(Json(CourseDetailResponse::from(detail)))
}
