//! Account endpoints: registration, login, and the caller's profile

use crate::api::handlers::AppState;
use crate::auth::jwt;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{
    LoginForm, ProfileResponse, RegisterRequest, TokenResponse, UserResponse,
};
use crate::auth::password;
use crate::core::error::{LmsError, Result};
use crate::db::models::UserRole;
use crate::db::repository::NewUser;
use axum::{extract::State, http::StatusCode, Form, Json};

/// POST /api/v1/auth/register
///
/// Creates a student account. The email must be unused; the password is
/// stored only as a bcrypt hash.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let full_name = request.full_name.trim();
    let email = request.email.trim();

    if full_name.is_empty() {
        return Err(LmsError::InvalidRequest("full_name is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(LmsError::InvalidRequest(
            "a valid email address is required".to_string(),
        ));
    }
    if request.password.is_empty() {
        return Err(LmsError::InvalidRequest("password is required".to_string()));
    }

    let password_hash = password::hash_password(&request.password)?;
    let user = state
        .user_repo
        .create(NewUser {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash,
            role: UserRole::Student,
        })
        .await?;

    tracing::info!(user_id = user.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Form-encoded credentials; the username field carries the email. A
/// successful login returns a bearer token whose subject is the email.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let user = state.user_repo.find_by_email(form.username.trim()).await?;

    let verified = match &user {
        Some(user) => password::verify_password(&form.password, &user.password_hash),
        // Burn a bcrypt verification anyway so unknown emails take as long
        // as wrong passwords.
        None => password::verify_password(&form.password, password::dummy_hash()),
    };

    let user = match (user, verified) {
        (Some(user), true) => user,
        _ => return Err(LmsError::InvalidCredentials),
    };

    let token = jwt::issue_token(&user.email, state.token_ttl_minutes, &state.jwt_secret)?;

    tracing::info!(user_id = user.id, "Login succeeded");

    Ok(Json(TokenResponse::bearer(token)))
}

/// GET /api/v1/users/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<ProfileResponse>> {
    let record = state
        .user_repo
        .find_by_email(&user.email)
        .await?
        .ok_or_else(|| LmsError::NotFound("Account no longer exists".to_string()))?;

    Ok(Json(ProfileResponse {
        id: record.id,
        full_name: record.full_name,
        email: record.email,
        role: record.role,
        created_at: record.created_at,
    }))
}
