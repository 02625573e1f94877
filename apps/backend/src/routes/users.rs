//! Account endpoints

use axum::{extract::State, Extension, Json};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::auth;
use crate::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let user = auth::register(&state.db, &request.email, &request.password).await?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        email: user.email,
        token: user.token,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = auth::login(&state.db, &request.email, &request.password).await?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        email: user.email,
        token: user.token,
    }))
}

/// PUT /api/account/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = state
        .db
        .get_user_by_email(&auth.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("account no longer active".to_string()))?;

    auth::change_password(
        &state.db,
        &user,
        &request.current_password,
        &request.new_password,
    )
    .await?;

    Ok(Json(serde_json::json!({ "updated": true })))
}

/// DELETE /api/account
pub async fn deactivate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>> {
    let deactivated = state.db.deactivate_user(auth.user_id).await?;

    Ok(Json(serde_json::json!({ "deactivated": deactivated })))
}
