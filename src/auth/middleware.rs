//! Bearer authentication middleware
//!
//! Applied to the protected route group. Validates the JWT from the
//! Authorization header, resolves the account it names, and stashes an
//! [`AuthUser`] in request extensions for handlers to extract.

use crate::api::handlers::AppState;
use crate::auth::jwt;
use crate::core::error::LmsError;
use crate::db::models::UserRole;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

/// The authenticated caller, resolved from a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Validate the bearer token and attach the caller to the request
///
/// Rejects with 401 when the header is missing or malformed, the token
/// fails validation, or the subject no longer maps to an account.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, LmsError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| LmsError::InvalidToken("Missing bearer token".to_string()))?;

    let claims = jwt::validate_token(token, &state.jwt_secret)?;

    let user = state
        .user_repo
        .find_by_email(&claims.sub)
        .await?
        .ok_or_else(|| LmsError::InvalidToken("Unknown account".to_string()))?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        full_name: user.full_name,
        email: user.email,
        role: user.role,
    });

    Ok(next.run(request).await)
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = LmsError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| LmsError::InvalidToken("Missing authentication".to_string()))
    }
}
