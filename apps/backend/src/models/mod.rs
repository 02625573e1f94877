//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from exercise-core
pub use exercise_core::{
    CompoundComponent, CompoundExercise, Exercise, ExerciseType, MissingChildPolicy,
    ResolvedComponent, SimpleExerciseDetail,
};

// === Database Entity Types ===

/// User account row
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub token: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Exercise row as stored in PostgreSQL (type is a plain string column)
#[derive(Debug, Clone, FromRow)]
pub struct DbExercise {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    pub exercise_type: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DbExercise {
    /// Convert to the core exercise type.
    pub fn to_exercise(&self) -> Exercise {
        Exercise {
            id: self.id,
            name: self.name.clone(),
            // The schema CHECK constraint keeps the column in range; an
            // unknown value maps to simple rather than failing every read.
            exercise_type: ExerciseType::from_str(&self.exercise_type)
                .unwrap_or(ExerciseType::Simple),
            description: self.description.clone(),
            created_at: self.created_at,
        }
    }
}

/// Compound component row
#[derive(Debug, Clone, FromRow)]
pub struct DbComponent {
    pub id: Uuid,
    pub parent_exercise_id: Uuid,
    pub child_exercise_id: Uuid,
    pub quantity: i32,
    pub order_index: i32,
}

impl DbComponent {
    pub fn to_component(&self) -> CompoundComponent {
        CompoundComponent {
            id: self.id,
            parent_exercise_id: self.parent_exercise_id,
            child_exercise_id: self.child_exercise_id,
            quantity: self.quantity,
            order_index: self.order_index,
        }
    }
}

/// Routine row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Routine {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Routine exercise row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoutineExercise {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub exercise_id: Uuid,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// === API Request Types ===

#[derive(Debug, Deserialize)]
pub struct CreateExerciseRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub description: Option<String>,
    pub detail: Option<SimpleExerciseDetail>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExerciseRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub exercise_type: Option<ExerciseType>,
    pub description: Option<String>,
    pub detail: Option<SimpleExerciseDetail>,
}

#[derive(Debug, Deserialize)]
pub struct AddComponentRequest {
    pub child_exercise_id: Uuid,
    pub quantity: i32,
    /// Allocated as max sibling index + 1 when omitted.
    pub order_index: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateComponentRequest {
    pub quantity: Option<i32>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SwapOrderRequest {
    pub component_a: Uuid,
    pub new_order_a: i32,
    pub component_b: Uuid,
    pub new_order_b: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoutineRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoutineRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddRoutineExerciseRequest {
    pub exercise_id: Uuid,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub duration: Option<i32>,
    pub rest_time: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoutineExerciseRequest {
    pub order_index: Option<i32>,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub duration: Option<i32>,
    pub rest_time: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub positions: Vec<ReorderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub order_index: i32,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateRoutineRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Admin partial update of another account's flags
#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

// === API Response Types ===

/// Exercise with its simple detail attached when present
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseWithDetail {
    #[serde(flatten)]
    pub exercise: Exercise,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<SimpleExerciseDetail>,
}

#[derive(Debug, Serialize)]
pub struct ExerciseListResponse {
    pub exercises: Vec<ExerciseWithDetail>,
}

#[derive(Debug, Serialize)]
pub struct ComponentResponse {
    pub component: CompoundComponent,
}

#[derive(Debug, Serialize)]
pub struct RoutineListResponse {
    pub routines: Vec<Routine>,
}

/// A routine exercise with its exercise attached where it still exists
#[derive(Debug, Serialize)]
pub struct RoutineExerciseWithDetail {
    #[serde(flatten)]
    pub routine_exercise: RoutineExercise,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<Exercise>,
}

#[derive(Debug, Serialize)]
pub struct RoutineWithExercises {
    #[serde(flatten)]
    pub routine: Routine,
    pub routine_exercises: Vec<RoutineExerciseWithDetail>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

/// User row as exposed to admins; no credential material
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_admin: user.is_admin,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_seen_at: user.last_seen_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}
