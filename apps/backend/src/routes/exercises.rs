//! Exercise and component endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Case-insensitive name filter
    pub q: Option<String>,
}

/// GET /api/exercises
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ExerciseListResponse>> {
    let exercises = match params.q.as_deref() {
        Some(query) => state.db.search_exercises(query).await?,
        None => state.db.get_all_exercises().await?,
    };

    Ok(Json(ExerciseListResponse { exercises }))
}

/// POST /api/exercises
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateExerciseRequest>,
) -> Result<Json<ExerciseWithDetail>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("exercise name is required".to_string()));
    }

    let exercise = state.db.create_exercise(&request).await?;
    Ok(Json(exercise))
}

/// GET /api/exercises/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExerciseWithDetail>> {
    let exercise = state
        .db
        .get_exercise_with_detail(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("exercise {}", id)))?;

    Ok(Json(exercise))
}

/// PUT /api/exercises/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExerciseRequest>,
) -> Result<Json<ExerciseWithDetail>> {
    // The type is fixed at creation; detail and component rows assume it.
    if let Some(requested_type) = request.exercise_type {
        let current = state
            .db
            .get_exercise(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("exercise {}", id)))?;
        if current.to_exercise().exercise_type != requested_type {
            return Err(ApiError::BadRequest(
                "exercise type cannot be changed after creation".to_string(),
            ));
        }
    }

    let exercise = state
        .db
        .update_exercise(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("exercise {}", id)))?;

    Ok(Json(exercise))
}

/// DELETE /api/exercises/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.db.delete_exercise(id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// GET /api/exercises/:id/compound
pub async fn get_compound(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompoundExercise>> {
    let compound = state
        .db
        .get_compound_exercise(id, state.missing_child_policy)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("compound exercise {}", id)))?;

    Ok(Json(compound))
}

/// GET /api/exercises/:id/assignable
pub async fn list_assignable(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExerciseListResponse>> {
    let exercises = state.db.list_assignable_exercises(id).await?;
    Ok(Json(ExerciseListResponse { exercises }))
}

/// POST /api/exercises/:id/components
pub async fn add_component(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddComponentRequest>,
) -> Result<Json<ComponentResponse>> {
    let component = state.db.add_component(id, &request).await?;

    Ok(Json(ComponentResponse {
        component: component.to_component(),
    }))
}

/// PUT /api/components/:id
pub async fn update_component(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateComponentRequest>,
) -> Result<Json<ComponentResponse>> {
    let component = state.db.update_component(id, &request).await?;

    Ok(Json(ComponentResponse {
        component: component.to_component(),
    }))
}

/// DELETE /api/components/:id
pub async fn remove_component(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.db.delete_component(id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// POST /api/components/swap
pub async fn swap_components(
    State(state): State<AppState>,
    Json(request): Json<SwapOrderRequest>,
) -> Result<Json<serde_json::Value>> {
    state.db.swap_component_order(&request).await?;
    Ok(Json(serde_json::json!({ "swapped": true })))
}
