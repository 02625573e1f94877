//! Routine endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/routines
pub async fn list(State(state): State<AppState>) -> Result<Json<RoutineListResponse>> {
    let routines = state.db.get_all_routines().await?;
    Ok(Json(RoutineListResponse { routines }))
}

/// POST /api/routines
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateRoutineRequest>,
) -> Result<Json<Routine>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("routine name is required".to_string()));
    }

    let routine = state.db.create_routine(&request).await?;
    Ok(Json(routine))
}

/// GET /api/routines/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoutineWithExercises>> {
    let routine = state
        .db
        .get_routine_with_exercises(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("routine {}", id)))?;

    Ok(Json(routine))
}

/// PUT /api/routines/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoutineRequest>,
) -> Result<Json<Routine>> {
    let routine = state
        .db
        .update_routine(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("routine {}", id)))?;

    Ok(Json(routine))
}

/// DELETE /api/routines/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.db.delete_routine(id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// POST /api/routines/:id/exercises
pub async fn add_exercise(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddRoutineExerciseRequest>,
) -> Result<Json<RoutineExercise>> {
    let row = state.db.add_routine_exercise(id, &request).await?;
    Ok(Json(row))
}

/// PUT /api/routine-exercises/:id
pub async fn update_exercise(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoutineExerciseRequest>,
) -> Result<Json<RoutineExercise>> {
    let row = state.db.update_routine_exercise(id, &request).await?;
    Ok(Json(row))
}

/// DELETE /api/routine-exercises/:id
pub async fn remove_exercise(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.db.remove_routine_exercise(id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// PUT /api/routines/:id/reorder
pub async fn reorder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<serde_json::Value>> {
    state
        .db
        .reorder_routine_exercises(id, &request.positions)
        .await?;

    Ok(Json(serde_json::json!({ "reordered": true })))
}

/// POST /api/routines/:id/duplicate
pub async fn duplicate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DuplicateRoutineRequest>,
) -> Result<Json<Routine>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("routine name is required".to_string()));
    }

    let routine = state.db.duplicate_routine(id, &request.name).await?;
    Ok(Json(routine))
}
