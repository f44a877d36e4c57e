//! API routes

use crate::api::handlers::{
    courses::{get_course, list_courses},
    enrollments::{enroll, list_my_enrollments},
    progress::{get_module_progress, reset_all_progress, update_lesson_progress},
    AppState,
};
use crate::auth::handlers::{login, me, register};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

/// Build the versioned API router: a public group for registration and
/// login, and a bearer-protected group for everything else.
pub fn build_api_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login));

    let protected_routes = Router::new()
        .route("/api/v1/users/me", get(me))
        // Course catalog
        .route("/api/v1/courses", get(list_courses))
        .route("/api/v1/courses/:id", get(get_course))
        .route("/api/v1/courses/:id/enroll", post(enroll))
        // Enrollments and progress
        .route("/api/v1/enrollments", get(list_my_enrollments))
        .route("/api/v1/lessons/:id/progress", put(update_lesson_progress))
        .route("/api/v1/modules/:id/progress", get(get_module_progress))
        // Administration
        .route("/api/v1/admin/progress/reset", post(reset_all_progress))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
