//! Admin user-management endpoints
//!
//! All routes here sit behind `auth::require_admin`.

use axum::{extract::Path, extract::State, Json};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>> {
    let users = state
        .db
        .get_all_users()
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    Ok(Json(UserListResponse { users }))
}

/// PUT /api/admin/users/:id
///
/// Partial update of another account's flags: promote/demote via
/// `is_admin`, activate/deactivate via `is_active`.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserSummary>> {
    let user = state
        .db
        .admin_update_user(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", id)))?;

    Ok(Json(UserSummary::from(user)))
}

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.db.delete_user(id).await?;

    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
