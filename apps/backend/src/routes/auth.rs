//! Authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::AppState;

/// Authenticated user info stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

/// Auth middleware - extracts the bearer token from the Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    // Skip auth for account creation, login and health check
    let path = request.uri().path();
    if path == "/api/auth/register" || path == "/api/auth/login" || path == "/health" {
        return Ok(next.run(request).await);
    }

    // Extract Bearer token
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?
        .to_string();

    // Look up user by token
    let user = state
        .db
        .get_user_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    // Update last_seen
    state.db.update_last_seen(user.id).await?;

    // Store authenticated user in request extensions
    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        is_admin: user.is_admin,
    });

    Ok(next.run(request).await)
}

/// Admin guard - runs after `auth_middleware` on admin routes
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response> {
    let is_admin = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.is_admin)
        .unwrap_or(false);

    if !is_admin {
        return Err(ApiError::Forbidden("admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
