//! Core types for the exercise domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether an exercise is atomic or composed of other exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Simple,
    Compound,
}

impl ExerciseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Compound => "compound",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "simple" => Some(Self::Simple),
            "compound" => Some(Self::Compound),
            _ => None,
        }
    }
}

/// An exercise, simple or compound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub exercise_type: ExerciseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Execution parameters attached to a simple exercise.
///
/// One-to-one with its owning exercise; has no independent lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleExerciseDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One edge of the composition graph: a child reference within a compound
/// exercise, with its quantity multiplier and 1-based order position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundComponent {
    pub id: Uuid,
    pub parent_exercise_id: Uuid,
    pub child_exercise_id: Uuid,
    pub quantity: i32,
    pub order_index: i32,
}

/// A component with its child exercise attached where it still exists.
///
/// `child_exercise` is `None` for dangling references (child deleted after
/// the edge was created).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedComponent {
    #[serde(flatten)]
    pub component: CompoundComponent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_exercise: Option<Exercise>,
}

/// A compound exercise with its ordered, resolved component list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundExercise {
    #[serde(flatten)]
    pub exercise: Exercise,
    pub components: Vec<ResolvedComponent>,
}
